//! FormVault API Server
//!
//! Main entry point for the FormVault resume-flow service.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formvault_api::{AppState, create_router};
use formvault_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // A bad cookie duration is a misconfigured deployment: refuse to start.
    let state = AppState::from_config(&config)
        .context("Invalid partial submission cookie configuration")?;
    info!(
        cookie = %state.token_store.cookie_name(),
        duration_days = state.token_store.duration().whole_days(),
        "Partial submission store configured"
    );

    match &state.storage {
        Some(storage) => info!(
            host = %storage.host_name,
            private = storage.is_private,
            "Blob storage configured"
        ),
        None => info!("Blob storage not configured"),
    }

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
