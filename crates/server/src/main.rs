//! Gallery server entry point.
//!
//! Serves the built site and proxies the Uploadcare file list on `/uploads`.
//! Logs are JSON on stderr.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use wedsite_core::AppConfig;

mod error;
mod handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let app = handler::router(handler::AppState::new(&config), &config.build_dir);

    let listener = tokio::net::TcpListener::bind(&config.gallery_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.gallery_addr))?;

    tracing::info!(addr = %config.gallery_addr, build_dir = %config.build_dir.display(), "gallery server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received SIGINT, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    }
}
