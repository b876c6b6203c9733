//! Storage error types.

use formvault_shared::AppError;
use thiserror::Error;

/// Failure to obtain a container read token.
///
/// Cloneable so a resolved `ReadTokenSet` can be shared and inspected by
/// every render path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenIssueError {
    /// The token-issuing service could not be reached.
    #[error("token service unavailable: {0}")]
    Unavailable(String),

    /// The token-issuing service rejected the request.
    #[error("token request rejected for container '{container}': {reason}")]
    Rejected {
        /// Container the token was requested for.
        container: String,
        /// Reason given by the service.
        reason: String,
    },
}

impl TokenIssueError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a rejected error.
    #[must_use]
    pub fn rejected(container: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            container: container.into(),
            reason: reason.into(),
        }
    }
}

impl From<TokenIssueError> for AppError {
    fn from(err: TokenIssueError) -> Self {
        Self::Transport(err.to_string())
    }
}
