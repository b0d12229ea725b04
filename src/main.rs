//! Bhaav - text-analysis server
//!
//! Binds and serves immediately; models load in a background task and each
//! endpoint answers 503 for its capability until that model is ready.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::limit::ConcurrencyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bhaav::config::ServerConfig;
use bhaav::handlers::{build_router, ServiceState};
use bhaav::{loader, metrics};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    metrics::register_metrics().expect("Failed to register metrics");
    info!("📊 Metrics registered at /metrics");

    info!("🪷 Starting bhaav text-analysis server...");

    // Load configuration from environment
    let config = ServerConfig::from_env();
    config.log();

    let state = Arc::new(ServiceState::new(config.clone()));

    // Fire-and-forget: model construction runs on the blocking pool and
    // publishes into the registry; request handling never awaits it.
    loader::spawn(state.registry_handle(), config.clone());

    // Build CORS layer from configuration
    let cors = config.cors.to_layer();

    let app = build_router(state)
        .layer(axum::middleware::from_fn(bhaav::middleware::track_metrics))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {e}"))?;
    info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}

/// Handle graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
