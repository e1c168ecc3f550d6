//! Password hashing
//!
//! New hashes are Argon2id with default parameters. Rows written by the
//! previous Node backend carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`) and are
//! still accepted at login.

use std::sync::OnceLock;

use anyhow::{Result, anyhow, bail};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};

/// Hash checked when a login names no account, built on first use
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hash a password on the blocking pool
pub async fn hash_password(plain: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_blocking(&plain)).await?
}

/// Check a password against a stored hash on the blocking pool
pub async fn verify_password(plain: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &hash)).await?
}

/// Run a full Argon2 verification for a login that matched no account, so
/// that unknown emails cost as much as wrong passwords
pub async fn verify_dummy(plain: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let hash = match DUMMY_HASH.get() {
            Some(hash) => hash,
            None => {
                let hash = hash_blocking("makerspace-no-such-account")?;
                DUMMY_HASH.get_or_init(|| hash)
            }
        };
        verify_blocking(&plain, hash).map(|_| ())
    })
    .await?
}

fn hash_blocking(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(hash)
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

fn verify_blocking(plain: &str, hash: &str) -> Result<bool> {
    if hash.starts_with("$argon2") {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;
        return Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok());
    }

    if is_bcrypt(hash) {
        return bcrypt::verify(plain, hash).map_err(|e| anyhow!("Failed to verify bcrypt hash: {}", e));
    }

    bail!("Unrecognized password hash format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dummy_verification_uses_a_real_argon2_hash() {
        verify_dummy("secret1".to_string()).await.unwrap();
        verify_dummy("anything".to_string()).await.unwrap();

        let hash = DUMMY_HASH.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("secret1".into(), hash.clone()).await.unwrap());
    }

    #[tokio::test]
    async fn argon2_hash_round_trip() {
        let hash = hash_password("secret1".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "secret1");

        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let first = hash_password("secret1".to_string()).await.unwrap();
        let second = hash_password("secret1".to_string()).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn legacy_bcrypt_hashes_still_verify() {
        let legacy = bcrypt::hash("secret1", 4).unwrap();

        assert!(verify_password("secret1".into(), legacy.clone()).await.unwrap());
        assert!(!verify_password("nope".into(), legacy).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_hash_format_is_an_error() {
        assert!(verify_password("secret1".into(), "plain-text".into()).await.is_err());
    }
}
