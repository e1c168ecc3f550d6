//! Authentication middleware for JWT token validation

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Authentication middleware
///
/// Verifies the bearer token, then re-reads the user so tokens of deleted
/// accounts stop working before they expire.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Authorization(bearer) = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized("Access denied. No token provided."))?;

    let claims = state.jwt_service.validate(bearer.token()).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            warn!("Token subject {} no longer exists", claims.sub);
            ApiError::Unauthorized("Invalid token or user no longer exists")
        })?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        email: user.email,
    });

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized("Access denied. No token provided."))
    }
}
