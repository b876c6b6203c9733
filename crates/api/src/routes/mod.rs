//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod partial_submissions;
pub mod storage;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(partial_submissions::routes())
        .merge(storage::routes())
}
