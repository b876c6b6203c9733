//! Transport error types.

use formvault_shared::AppError;
use thiserror::Error;

/// Failure talking to the upload, SAS, delete or blob endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never got a response.
    #[error("request failed: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {message}")]
    Endpoint {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The request could not be built from the given input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Create a network error.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an endpoint error.
    #[must_use]
    pub fn endpoint(status: u16, message: impl Into<String>) -> Self {
        Self::Endpoint {
            status,
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidRequest(msg) => Self::Validation(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_app_error() {
        let app: AppError = TransportError::endpoint(503, "busy").into();
        assert_eq!(app.status_code(), 502);
        assert_eq!(app.to_string(), "Transport error: endpoint returned 503: busy");

        let app: AppError = TransportError::InvalidRequest("bad url".to_string()).into();
        assert_eq!(app.status_code(), 400);
    }
}
