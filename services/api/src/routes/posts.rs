//! Post publishing and feed routes

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthUser,
    models::{CreatePostRequest, NewPost},
    state::AppState,
    validation,
};

/// Publish a post as the authenticated user
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    WithRejection(Json(payload), _): WithRejection<Json<CreatePostRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let (Some(post_image), Some(description)) = (payload.post_image, payload.description) else {
        return Err(ApiError::bad_request("Image and description are required"));
    };

    validation::validate_post_image(&post_image).map_err(ApiError::BadRequest)?;
    validation::validate_description(&description).map_err(ApiError::BadRequest)?;

    let post = state
        .post_repository
        .create(&NewPost {
            author_id: auth.id,
            post_image: post_image.trim().to_string(),
            description: description.trim().to_string(),
        })
        .await?;

    info!("User {} published post {}", auth.id, post.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post published successfully",
            "post": post,
        })),
    ))
}

/// The whole feed, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let feed = state.post_repository.feed().await?;
    Ok(Json(feed))
}
