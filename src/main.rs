use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use copdash::api::routes::create_router;
use copdash::api::state::AppState;
use copdash::config::DashboardConfig;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, stopping");
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(DashboardConfig::from_env()?);
    for token in config.tokens() {
        tracing::info!("Tracking {} at {} on chain {}", token.label, token.address, token.chain_id);
    }

    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.bind, config.port))?;

    let state = AppState::new(Arc::clone(&config));
    let app = create_router(state);

    tracing::info!("Dashboard listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
