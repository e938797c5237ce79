//! AI Gateway admin API
//!
//! Access-token lifecycle for the gateway plus in-process request accounting:
//! - Token generation, validation, masking and administration
//! - Bearer authentication middleware for protected routes
//! - A request counter with a smoothed per-second rate
//! - In-memory or PostgreSQL token storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use api::state::AppState;
use config::{StorageBackend, StorageConfig};
use domain::token::TokenRepository;
use infrastructure::storage::migrations::run_token_migrations;
use infrastructure::token::{InMemoryTokenRepository, PostgresTokenRepository};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    info!("Storage backend: {:?}", config.storage.backend);

    let repository: Arc<dyn TokenRepository> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryTokenRepository::new()),
        StorageBackend::Postgres => {
            let pool = connect_postgres(&config.storage).await?;

            run_token_migrations(&pool)
                .await
                .context("Failed to apply migrations")?;

            Arc::new(PostgresTokenRepository::new(pool))
        }
    };

    Ok(AppState::from_repository(
        repository,
        config.stats.window_seconds,
    ))
}

/// Open a PostgreSQL pool from the storage configuration
pub async fn connect_postgres(config: &StorageConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .resolve_database_url()
        .context("storage.database_url or DATABASE_URL is required for the postgres backend")?;

    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection established");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_state() {
        let state = create_app_state().await.unwrap();

        assert!(state.token_service.list_tokens().await.unwrap().is_empty());
        assert_eq!(state.request_counter.total(), 0);
        assert_eq!(state.request_counter.window(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            database_url: Some(String::new()),
            max_connections: 1,
        };

        let err = connect_postgres(&config).await.unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
