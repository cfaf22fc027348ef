//! HTTP server startup and shutdown

use anyhow::{Context, Result};
use axum::Router;
use mugshot_core::Config;
use std::net::SocketAddr;

/// Start the HTTP server
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        address = %addr,
        environment = %config.environment(),
        max_download_bytes = config.avatar.max_download_bytes,
        fetch_timeout_seconds = config.avatar.fetch_timeout_seconds,
        allowed_schemes = %config.avatar.allowed_schemes.join(","),
        host_allowlist = %config.avatar.host_allowlist.join(","),
        allowed_extensions = %config.avatar.allowed_extensions.join(","),
        "Server ready"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shut down gracefully");

    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
///
/// # Panics
///
/// Panics if the signal handlers cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
