//! PostgreSQL inventory ledger for rooms and bookings.
//!
//! Connection-pool construction, migrations, and the repository layer. The
//! pool is created by the process hosting the engine and passed down
//! explicitly; nothing in this crate holds global state.

pub mod models;
pub mod repositories;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Database connection settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string (`DATABASE_URL`). No default: connecting to a
    /// guessed database is worse than refusing to start.
    pub url: String,
    /// Pool size (`DATABASE_MAX_CONNECTIONS`, default `20`).
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    /// (`DATABASE_ACQUIRE_TIMEOUT_SECS`, default `5`).
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load configuration from the environment, reading `.env` if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DATABASE_MAX_CONNECTIONS must be a valid u32");

        let acquire_timeout_secs: u64 = std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("DATABASE_ACQUIRE_TIMEOUT_SECS must be a valid u64");

        Self {
            url,
            max_connections,
            acquire_timeout_secs,
        }
    }
}

/// Create a connection pool from the given settings.
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Verify the database answers queries.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
