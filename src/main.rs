//! entry-tracker server entry point.
//!
//! Opens the configured storage backend and serves the REST API.

use std::io::ErrorKind;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use entry_tracker::api;
use entry_tracker::app_state::AppState;
use entry_tracker::config::ServerConfig;
use entry_tracker::persistence::Storage;
use entry_tracker::service::TrackerService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        storage = %config.storage_type,
        "starting entry-tracker"
    );

    // Open storage
    let storage = Storage::open(&config)
        .await
        .with_context(|| format!("failed to open {} storage", config.storage_type))?;

    // Build application state
    let app_state = AppState::new(TrackerService::new(storage));

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone());

    // Start server
    let listener = bind_with_fallback(config.listen_addr, config.port_fallback_attempts).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app_state.service.storage().close().await;
    tracing::info!("server stopped");
    Ok(())
}

/// Binds `addr`, moving to the next port while the current one is in use,
/// for at most `attempts` extra ports.
async fn bind_with_fallback(addr: SocketAddr, attempts: u16) -> anyhow::Result<TcpListener> {
    let mut candidate = addr;
    let mut remaining = attempts;
    loop {
        match TcpListener::bind(candidate).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse && remaining > 0 => {
                let Some(next_port) = candidate.port().checked_add(1) else {
                    return Err(e).with_context(|| format!("failed to bind {candidate}"));
                };
                tracing::warn!(port = candidate.port(), next_port, "port is busy, trying next");
                candidate.set_port(next_port);
                remaining -= 1;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to bind {candidate}")),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
