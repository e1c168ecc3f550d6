//! In-memory repositories for handler tests

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};

use super::{PostRepository, UserRepository};
use crate::models::{Author, FeedEntry, NewPost, NewUser, Post, StoredImage, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
}

/// Shared store implementing both repository traits, mirroring the
/// `users_email_key` constraint and the feed ordering of the SQL schema
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn post_count(&self) -> usize {
        self.tables().posts.len()
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    /// Delete a user and their posts, as `ON DELETE CASCADE` would
    pub fn delete_user(&self, id: i64) {
        let mut tables = self.tables();
        tables.users.retain(|u| u.id != id);
        tables.posts.retain(|p| p.author_id != id);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut tables = self.tables();

        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }

        let (profile_image, profile_image_path) = match &new_user.image {
            Some(StoredImage::Inline { bytes, .. }) => (Some(bytes.clone()), None),
            Some(StoredImage::File { file_name, .. }) => (None, Some(file_name.clone())),
            None => (None, None),
        };

        let user = User {
            id: tables.users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: new_user.username.clone(),
            login: new_user.login.clone(),
            email: new_user.email.clone(),
            password: new_user.password_hash.clone(),
            profile_image,
            profile_image_path,
            image_mimetype: new_user.image.as_ref().map(|i| i.mime_type().to_string()),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn email_exists(&self, email: &str) -> DatabaseResult<bool> {
        Ok(self.tables().users.iter().any(|u| u.email == email))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, new_post: &NewPost) -> DatabaseResult<Post> {
        let mut tables = self.tables();

        let post = Post {
            id: tables.posts.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            author_id: new_post.author_id,
            post_image: new_post.post_image.clone(),
            description: new_post.description.clone(),
            timestamp: Utc::now(),
        };
        tables.posts.push(post.clone());

        Ok(post)
    }

    async fn feed(&self) -> DatabaseResult<Vec<FeedEntry>> {
        let tables = self.tables();

        let mut entries: Vec<FeedEntry> = tables
            .posts
            .iter()
            .filter_map(|post| {
                let author = tables.users.iter().find(|u| u.id == post.author_id)?;
                Some(FeedEntry {
                    id: post.id,
                    post_image: post.post_image.clone(),
                    description: post.description.clone(),
                    timestamp: post.timestamp,
                    author: Author {
                        id: author.id,
                        username: author.username.clone(),
                        profile_image: author.profile_image_url(),
                    },
                })
            })
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}
