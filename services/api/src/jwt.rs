//! JWT service for token issuance and validation
//!
//! Tokens are signed with HS256 when `JWT_SECRET` is set, which matches the
//! tokens issued by the previous backend. Otherwise an RS256 key pair is
//! loaded from `JWT_PRIVATE_KEY` / `JWT_PUBLIC_KEY`.

use anyhow::{Result, anyhow};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::User;

/// Signing material
#[derive(Debug, Clone)]
pub enum JwtKeys {
    /// Shared secret, HS256
    Secret(String),
    /// PEM encoded key pair, RS256
    Rsa {
        private_key: String,
        public_key: String,
    },
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub keys: JwtKeys,
    /// Token lifetime in seconds (default: 8 hours)
    pub expiry: u64,
}

/// Inline PEM is used as is; anything else is treated as a path, tried
/// relative to the working directory and then to the crate root
fn read_pem(var: &str, value: String) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    std::fs::read_to_string(&value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(&value);
            std::fs::read_to_string(path)
        })
        .map(|pem| pem.trim().to_string())
        .map_err(|e| anyhow!("Failed to read {} file: {}", var, e))
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC secret; takes precedence over the key pair
    /// - `JWT_PRIVATE_KEY`: Private key (PEM or path to PEM file)
    /// - `JWT_PUBLIC_KEY`: Public key (PEM or path to PEM file)
    /// - `JWT_EXPIRY`: Token lifetime in seconds (default: 28800)
    pub fn from_env() -> Result<Self> {
        let keys = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => JwtKeys::Secret(secret),
            _ => {
                let private_key = std::env::var("JWT_PRIVATE_KEY").map_err(|_| {
                    anyhow!("Neither JWT_SECRET nor JWT_PRIVATE_KEY environment variable is set")
                })?;
                let public_key = std::env::var("JWT_PUBLIC_KEY")
                    .map_err(|_| anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

                JwtKeys::Rsa {
                    private_key: read_pem("JWT_PRIVATE_KEY", private_key)?,
                    public_key: read_pem("JWT_PUBLIC_KEY", public_key)?,
                }
            }
        };

        let expiry = std::env::var("JWT_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(28_800); // 8 hours

        Ok(JwtConfig { keys, expiry })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub username: String,
    pub email: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let (encoding_key, decoding_key, algorithm) = match &config.keys {
            JwtKeys::Secret(secret) => (
                EncodingKey::from_secret(secret.as_bytes()),
                DecodingKey::from_secret(secret.as_bytes()),
                Algorithm::HS256,
            ),
            JwtKeys::Rsa {
                private_key,
                public_key,
            } => (
                EncodingKey::from_rsa_pem(private_key.as_bytes())?,
                DecodingKey::from_rsa_pem(public_key.as_bytes())?,
                Algorithm::RS256,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            algorithm,
            validation,
            expiry: config.expiry,
        })
    }

    /// Issue a token for a user
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.expiry,
        };

        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String> {
        let token = encode(&Header::new(self.algorithm), claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate signature and expiry and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Token lifetime in seconds
    pub fn expiry(&self) -> u64 {
        self.expiry
    }
}
