//! notify-hub server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and shuts
//! the hub down on ctrl-c or SIGTERM.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use notify_hub::api;
use notify_hub::app_state::AppState;
use notify_hub::config::{HubConfig, LogFormat};
use notify_hub::hub::Hub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = HubConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting notify-hub");

    // Build hub and application state
    let hub = Hub::new();
    let state = AppState::new(hub.clone(), config.connection);
    let connections = state.connections.clone();
    let app = api::build_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(hub))
        .await
        .context("serving HTTP")?;

    // Upgraded connections are not covered by graceful shutdown; give their
    // outbound tasks time to send close frames.
    let deadline = config.connection.write_timeout + Duration::from_secs(1);
    if !connections.drain(deadline).await {
        tracing::warn!(?deadline, "some connections did not close in time");
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM after closing every hub connection.
async fn shutdown_signal(hub: Hub) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    let closed = hub.shutdown().await;
    tracing::info!(connections = closed, "shutdown signal received");
}
