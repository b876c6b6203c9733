//! Storage capability for rendering clients.
//!
//! Tells a client whether stored asset URLs need read tokens, which host
//! they live on and which container holds what.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Storage capability response.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageCapabilityResponse {
    /// Storage is configured.
    pub is_enabled: bool,
    /// Object URLs need a read token.
    pub is_private: bool,
    /// Blob host name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Container for end-user uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_files_container: Option<String>,
    /// Container for form content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_container: Option<String>,
}

/// GET `/storage/capability`
async fn get_capability(State(state): State<AppState>) -> Json<StorageCapabilityResponse> {
    let response = match state.storage.as_deref() {
        Some(config) => StorageCapabilityResponse {
            is_enabled: config.is_enabled,
            is_private: config.is_private,
            host_name: Some(config.host_name.clone()),
            user_files_container: Some(config.container_names.user_files.clone()),
            content_container: Some(config.container_names.content.clone()),
        },
        None => StorageCapabilityResponse {
            is_enabled: false,
            is_private: false,
            host_name: None,
            user_files_container: None,
            content_container: None,
        },
    };
    Json(response)
}

/// Creates storage routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/storage/capability", get(get_capability))
}
