//! Serve command - runs the HTTP API until Ctrl+C or SIGTERM

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::{create_router, create_router_with_metrics};
use crate::infrastructure::observability::init_metrics;

use super::{bootstrap, build_socket_addr};

pub async fn run() -> anyhow::Result<()> {
    let config = bootstrap();

    let state = crate::create_app_state_with_config(&config).await?;
    let rotation = state.request_counter.spawn_rotation();

    let app = match init_metrics(&config.metrics) {
        Some(metrics) => create_router_with_metrics(state, &config.metrics.path, metrics),
        None => create_router(state),
    };

    let addr = build_socket_addr(&config)?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    rotation.stop().await;
    info!("API server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
