//! Read token issuance over HTTP.

use std::time::Duration;

use formvault_core::files::TransportError;
use formvault_core::storage::{ContainerReadToken, TokenIssueError, TokenIssuer};
use reqwest::StatusCode;
use tracing::debug;

use crate::USER_AGENT;
use crate::endpoint::ApiEndpoints;
use crate::response::read_json;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches container read tokens from the token-issuing service.
///
/// Wrap in [`formvault_core::storage::CachingTokenIssuer`] to share granted
/// tokens across rendering sessions of the same viewer.
#[derive(Debug, Clone)]
pub struct HttpTokenIssuer {
    client: reqwest::Client,
    endpoints: ApiEndpoints,
}

impl HttpTokenIssuer {
    /// Create an issuer for the given API base URL.
    pub fn new(api_base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, ApiEndpoints::new(api_base_url)?))
    }

    /// Create an issuer around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoints: ApiEndpoints) -> Self {
        Self { client, endpoints }
    }
}

impl TokenIssuer for HttpTokenIssuer {
    async fn issue_read_token(&self, container: &str) -> Result<ContainerReadToken, TokenIssueError> {
        let url = self
            .endpoints
            .read_token(container)
            .map_err(|e| TokenIssueError::unavailable(e.to_string()))?;
        debug!(container = %container, "Requesting read token");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TokenIssueError::unavailable(e.to_string()))?;

        read_json(response).await.map_err(|e| match e {
            TransportError::Endpoint { status, message }
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                TokenIssueError::rejected(container, message)
            }
            other => TokenIssueError::unavailable(other.to_string()),
        })
    }
}
