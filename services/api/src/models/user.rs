//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::uploads;

/// User entity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub login: String,
    pub email: String,
    /// Password hash, never the plain text
    pub password: String,
    pub profile_image: Option<Vec<u8>>,
    pub profile_image_path: Option<String>,
    pub image_mimetype: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public URL for the profile image, if the user has one
    pub fn profile_image_url(&self) -> Option<String> {
        uploads::profile_image_url(
            self.profile_image.as_deref(),
            self.profile_image_path.as_deref(),
            self.image_mimetype.as_deref(),
        )
    }
}

/// A profile image after it has been accepted for storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredImage {
    /// Bytes kept in the user row
    Inline { bytes: Vec<u8>, mime_type: String },
    /// File written under the upload directory
    File { file_name: String, mime_type: String },
}

impl StoredImage {
    pub fn mime_type(&self) -> &str {
        match self {
            StoredImage::Inline { mime_type, .. } | StoredImage::File { mime_type, .. } => {
                mime_type
            }
        }
    }
}

/// New user creation payload
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub image: Option<StoredImage>,
}

/// JSON body of `POST /api/auth/register`
///
/// `profile_image` may carry a base64 data URL.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub login: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_image: Option<String>,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public user projection; never includes the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub login: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            login: user.login.clone(),
            email: user.email.clone(),
            profile_image: user.profile_image_url(),
            created_at: user.created_at,
        }
    }
}
