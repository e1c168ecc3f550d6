//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Post entity as stored in `posts`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub post_image: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// New post creation payload
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub post_image: String,
    pub description: String,
}

/// Body of `POST /api/posts`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub post_image: Option<String>,
    pub description: Option<String>,
}

/// Author projection embedded in each feed entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub profile_image: Option<String>,
}

/// One element of `GET /api/posts`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: i64,
    pub post_image: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub author: Author,
}
