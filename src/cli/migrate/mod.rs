//! Migrate command - applies the token schema to PostgreSQL

use anyhow::Context;
use tracing::info;

use crate::infrastructure::storage::migrations::run_token_migrations;

use super::bootstrap;

pub async fn run() -> anyhow::Result<()> {
    let config = bootstrap();

    let pool = crate::connect_postgres(&config.storage).await?;

    let applied = run_token_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;

    info!(applied, "Migrations complete");

    Ok(())
}
