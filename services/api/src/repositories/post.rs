//! Post repository for database operations

use async_trait::async_trait;
use common::error::DatabaseResult;
use sqlx::{PgPool, Row};

use super::PostRepository;
use crate::{
    models::{Author, FeedEntry, NewPost, Post},
    uploads,
};

/// Postgres-backed post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Create a new post repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, new_post: &NewPost) -> DatabaseResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (post_image, description, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, author_id, post_image, description, "timestamp"
            "#,
        )
        .bind(&new_post.post_image)
        .bind(&new_post.description)
        .bind(new_post.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn feed(&self) -> DatabaseResult<Vec<FeedEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.post_image, p.description, p."timestamp",
                   u.id AS author_id, u.username, u.profile_image,
                   u.profile_image_path, u.image_mimetype
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p."timestamp" DESC, p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DatabaseResult<FeedEntry> {
                let profile_image: Option<Vec<u8>> = row.try_get("profile_image")?;
                let profile_image_path: Option<String> = row.try_get("profile_image_path")?;
                let image_mimetype: Option<String> = row.try_get("image_mimetype")?;

                Ok(FeedEntry {
                    id: row.try_get("id")?,
                    post_image: row.try_get("post_image")?,
                    description: row.try_get("description")?,
                    timestamp: row.try_get("timestamp")?,
                    author: Author {
                        id: row.try_get("author_id")?,
                        username: row.try_get("username")?,
                        profile_image: uploads::profile_image_url(
                            profile_image.as_deref(),
                            profile_image_path.as_deref(),
                            image_mimetype.as_deref(),
                        ),
                    },
                })
            })
            .collect()
    }
}
