//! Server settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `config/makerspace.{toml,yaml,json}` file, then `MAKERSPACE_`-prefixed
//! environment variables (`MAKERSPACE_PORT`, `MAKERSPACE_IMAGE_STORAGE`,
//! `MAKERSPACE_UPLOAD_DIR`, ...).

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Where uploaded profile images end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStorage {
    /// Raw bytes in `users.profile_image`
    Database,
    /// Files under `upload_dir`, file name in `users.profile_image_path`
    Disk,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub image_storage: ImageStorage,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from("config/makerspace")
    }

    fn load_from(file: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("image_storage", "database")?
            .set_default("upload_dir", "uploads")?
            .set_default("max_upload_bytes", 5 * 1024 * 1024)?
            .set_default("login_max_attempts", 5)?
            .set_default("login_window_seconds", 300)?
            .set_default("login_ban_seconds", 900)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("MAKERSPACE").try_parsing(true))
            .build()
            .context("failed to assemble settings")?;

        settings
            .try_deserialize()
            .context("invalid server settings")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "PORT",
        "HOST",
        "MAKERSPACE_PORT",
        "MAKERSPACE_IMAGE_STORAGE",
        "MAKERSPACE_UPLOAD_DIR",
        "MAKERSPACE_MAX_UPLOAD_BYTES",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_file_or_env() {
        clear_env();

        let settings = Settings::load_from("config/does-not-exist").unwrap();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.image_storage, ImageStorage::Database);
        assert_eq!(settings.upload_dir, PathBuf::from("uploads"));
        assert_eq!(settings.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(settings.login_max_attempts, 5);
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        unsafe {
            std::env::set_var("MAKERSPACE_PORT", "4100");
            std::env::set_var("MAKERSPACE_IMAGE_STORAGE", "disk");
            std::env::set_var("MAKERSPACE_UPLOAD_DIR", "/var/lib/makerspace/uploads");
        }

        let settings = Settings::load_from("config/does-not-exist").unwrap();
        assert_eq!(settings.port, 4100);
        assert_eq!(settings.image_storage, ImageStorage::Disk);
        assert_eq!(
            settings.upload_dir,
            PathBuf::from("/var/lib/makerspace/uploads")
        );
        assert!(settings.bind_addr().ends_with(":4100"));

        clear_env();
    }

    #[test]
    #[serial]
    fn unknown_storage_mode_is_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("MAKERSPACE_IMAGE_STORAGE", "s3");
        }

        assert!(Settings::load_from("config/does-not-exist").is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn unprefixed_variables_are_ignored() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "9999");
            std::env::set_var("HOST", "203.0.113.7");
        }

        let settings = Settings::load_from("config/does-not-exist").unwrap();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.host, "0.0.0.0");

        clear_env();
    }
}
