//! Resume-flow routes over the continuation token cookie.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Continuation token body, used for both reads and writes.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenBody {
    /// Continuation token.
    pub token: String,
}

/// Creates the partial-submission routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/partial-submissions/{form_id}",
        get(get_token).put(put_token).delete(delete_token),
    )
}

/// GET `/partial-submissions/{form_id}`
async fn get_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(form_id): Path<String>,
) -> Result<Json<TokenBody>, ApiError> {
    let token = state.token_store.get_token(&jar, &form_id)?;
    Ok(Json(TokenBody { token }))
}

/// PUT `/partial-submissions/{form_id}`
async fn put_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(form_id): Path<String>,
    Json(payload): Json<TokenBody>,
) -> Result<impl IntoResponse, ApiError> {
    let jar = state.token_store.set_token(jar, &form_id, &payload.token)?;
    info!(form_id = %form_id, "Partial submission token stored");
    Ok((StatusCode::NO_CONTENT, jar))
}

/// DELETE `/partial-submissions/{form_id}`
async fn delete_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(form_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let jar = state.token_store.delete_token(jar, &form_id)?;
    info!(form_id = %form_id, "Partial submission token removed");
    Ok((StatusCode::NO_CONTENT, jar))
}
