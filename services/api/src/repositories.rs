//! Repositories for database operations
//!
//! Handlers talk to the store through these traits; the Postgres
//! implementations live in the submodules.

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{FeedEntry, NewPost, NewUser, Post, User};

pub mod post;
pub mod user;

#[cfg(test)]
pub mod memory;

pub use post::PgPostRepository;
pub use user::PgUserRepository;

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a taken email surfaces as `DatabaseError::UniqueViolation`
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> DatabaseResult<bool>;

    /// Whether the backing store answers
    async fn health_check(&self) -> bool;
}

/// Post persistence
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, new_post: &NewPost) -> DatabaseResult<Post>;

    /// Every post with its author, newest first
    async fn feed(&self) -> DatabaseResult<Vec<FeedEntry>>;
}
