//! Response status mapping.
//!
//! The only place that interprets HTTP status codes.

use formvault_core::files::TransportError;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Map a reqwest failure to a transport error.
pub(crate) fn network_error(err: &reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::decode(err.to_string())
    } else {
        TransportError::network(err.to_string())
    }
}

/// Fail on a non-success status, keeping the endpoint's error text.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::endpoint(
        status.as_u16(),
        error_message(status, &body),
    ))
}

/// Decode a JSON body from a successful response.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await.map_err(|e| network_error(&e))?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::decode(e.to_string()))
}

/// `{"error": "..."}` text if present, else the trimmed body, else the reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(serde_json::Value::String(error)) = map.get("error")
    {
        return error.clone();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"file too large"}"#),
            "file too large"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "  upstream down \n"),
            "upstream down"
        );
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }
}
