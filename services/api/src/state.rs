//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    jwt::JwtService,
    rate_limiter::RateLimiter,
    repositories::{PostRepository, UserRepository},
    uploads::ImageStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub post_repository: Arc<dyn PostRepository>,
    pub jwt_service: JwtService,
    pub image_store: ImageStore,
    pub login_limiter: RateLimiter,
}
