//! User repository for database operations

use async_trait::async_trait;
use common::{database, error::DatabaseResult};
use sqlx::PgPool;
use tracing::info;

use super::UserRepository;
use crate::models::{NewUser, StoredImage, User};

const USER_COLUMNS: &str = "id, username, login, email, password, profile_image, \
                            profile_image_path, image_mimetype, created_at";

/// Postgres-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let (bytes, path) = match &new_user.image {
            Some(StoredImage::Inline { bytes, .. }) => (Some(bytes.as_slice()), None),
            Some(StoredImage::File { file_name, .. }) => (None, Some(file_name.as_str())),
            None => (None, None),
        };
        let mime_type = new_user.image.as_ref().map(StoredImage::mime_type);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, login, email, password, profile_image,
                               profile_image_path, image_mimetype)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.login)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(bytes)
        .bind(path)
        .bind(mime_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> DatabaseResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn health_check(&self) -> bool {
        database::health_check(&self.pool).await
    }
}
