use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod error;
mod jwt;
mod middleware;
mod models;
mod password;
mod rate_limiter;
mod repositories;
mod routes;
mod settings;
mod state;
mod uploads;
mod validation;

use common::database::{DatabaseConfig, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{PgPostRepository, PgUserRepository},
    settings::Settings,
    state::AppState,
    uploads::ImageStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    info!("Starting makerspace API");

    let settings = Settings::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if !common::database::health_check(&pool).await {
        anyhow::bail!("Failed to connect to database");
    }
    info!("Database connection successful");

    if db_config.run_migrations {
        run_migrations(&pool).await?;
    }

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let image_store = ImageStore::from_settings(&settings);
    image_store.prepare().await?;

    let app_state = AppState {
        user_repository: Arc::new(PgUserRepository::new(pool.clone())),
        post_repository: Arc::new(PgPostRepository::new(pool)),
        jwt_service,
        image_store,
        login_limiter: RateLimiter::new(RateLimiterConfig::from(&settings)),
    };

    let app = routes::create_router(app_state);

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Makerspace API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Makerspace API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down makerspace API");
}
