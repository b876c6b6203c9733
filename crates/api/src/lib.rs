//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - The partial-submission continuation token store (cookie backed)
//! - Resume-flow routes over that store
//! - Public storage capability for rendering clients
//! - JSON error responses

pub mod error;
pub mod partial_submission;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use formvault_core::storage::{StorageConfig, resolve_storage_config};
use formvault_shared::AppConfig;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use partial_submission::{PartialSubmissionTokenStore, TokenStoreError};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Continuation token cookie store.
    pub token_store: Arc<PartialSubmissionTokenStore>,
    /// Storage capability, `None` when the tenant has no storage configured.
    pub storage: Option<Arc<StorageConfig>>,
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Fails when the partial-submission cookie settings are invalid; callers
    /// must treat that as fatal.
    pub fn from_config(config: &AppConfig) -> Result<Self, TokenStoreError> {
        Ok(Self {
            token_store: Arc::new(PartialSubmissionTokenStore::from_settings(
                &config.partial_submission,
            )?),
            storage: resolve_storage_config(&config.storage).map(Arc::new),
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
