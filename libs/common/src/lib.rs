//! Common library for the Makerspace backend
//!
//! This crate provides shared functionality used by the services, including
//! database connectivity, embedded schema migrations and error handling.

pub mod database;
pub mod error;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_pool, health_check, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     run_migrations(&pool).await?;
///     println!("Database healthy: {}", health_check(&pool).await);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
