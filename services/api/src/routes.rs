//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::auth_middleware,
    settings::ImageStorage,
    state::AppState,
    uploads::UPLOADS_ROUTE,
};

pub mod auth;
pub mod posts;

/// Room for the text fields of a registration on top of the image
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body accepted for an image of at most `max_image_bytes`
///
/// JSON registrations carry the image as base64, so the limit is sized for
/// the encoded form rather than the raw bytes.
pub fn body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.div_ceil(3) * 4 + FORM_OVERHEAD_BYTES
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes);

    if state.image_store.mode() == ImageStorage::Disk {
        router = router.nest_service(
            UPLOADS_ROUTE,
            ServeDir::new(state.image_store.upload_dir()),
        );
    }

    router
        .layer(DefaultBodyLimit::max(body_limit(
            state.image_store.max_bytes(),
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "makerspace-api",
        "database": state.user_repository.health_check().await,
    }))
}
