//! API models for request and response payloads

pub mod post;
pub mod user;

pub use post::{Author, CreatePostRequest, FeedEntry, NewPost, Post};
pub use user::{LoginRequest, NewUser, RegisterRequest, StoredImage, User, UserResponse};
