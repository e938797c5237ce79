//! CLI module for the AI Gateway admin service
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply PostgreSQL migrations and exit

pub mod migrate;
pub mod serve;

use std::net::SocketAddr;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// AI Gateway admin - access tokens and request accounting
#[derive(Parser)]
#[command(name = "ai-gateway-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Apply database migrations and exit
    Migrate,
}

/// Load `.env`, the layered configuration and the log subscriber
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    logging::init_logging(&config.logging);

    config
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}
