//! Container read tokens and the token-issuing seam.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::Expiry;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::ContainerKind;
use super::error::TokenIssueError;

/// Short-lived read credential for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReadToken {
    /// Query-string credential. `None` means access is denied for this container.
    pub token: Option<String>,
    /// Container the token applies to.
    pub container_name: String,
    /// When the token stops working.
    pub expires_on: DateTime<Utc>,
    /// When the token was minted.
    pub generated_at: DateTime<Utc>,
}

/// One token result per logical container.
///
/// Each entry fails independently: a failed `content` issuance never
/// affects `user_files` and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTokenSet {
    /// Token for the user uploads container.
    pub user_files: Result<ContainerReadToken, TokenIssueError>,
    /// Token for the form content container.
    pub content: Result<ContainerReadToken, TokenIssueError>,
}

impl ReadTokenSet {
    /// Get the token result for a logical container.
    #[must_use]
    pub fn get(&self, kind: ContainerKind) -> &Result<ContainerReadToken, TokenIssueError> {
        match kind {
            ContainerKind::UserFiles => &self.user_files,
            ContainerKind::Content => &self.content,
        }
    }
}

/// External token-issuing service.
pub trait TokenIssuer: Send + Sync {
    /// Issue a read token for the named container.
    fn issue_read_token(
        &self,
        container: &str,
    ) -> impl Future<Output = Result<ContainerReadToken, TokenIssueError>> + Send;
}

/// Tokens are evicted this long before they actually expire.
const EXPIRY_MARGIN: chrono::Duration = chrono::Duration::seconds(60);

/// Cached tokens are only shared between sessions of the same viewer scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    scope: String,
    container: String,
}

struct TokenExpiry;

impl Expiry<CacheKey, ContainerReadToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &ContainerReadToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        let remaining = value.expires_on - EXPIRY_MARGIN - Utc::now();
        Some(remaining.to_std().unwrap_or(Duration::ZERO))
    }
}

/// Token cache shared by the rendering sessions of many viewers.
///
/// Only granted tokens are cached. Denials and failed issuances go back to
/// the inner issuer every time, so a changed access decision shows up on the
/// next session.
pub struct CachingTokenIssuer<I> {
    inner: I,
    cache: Cache<CacheKey, ContainerReadToken>,
}

impl<I: TokenIssuer> CachingTokenIssuer<I> {
    /// Maximum number of cached container tokens.
    pub const DEFAULT_CAPACITY: u64 = 1024;

    /// Wrap an issuer with a token cache.
    #[must_use]
    pub fn new(inner: I) -> Self {
        let cache = Cache::builder()
            .max_capacity(Self::DEFAULT_CAPACITY)
            .expire_after(TokenExpiry)
            .build();
        Self { inner, cache }
    }

    /// Issuer for one viewer scope, e.g. tenant and principal of a session.
    #[must_use]
    pub fn scoped(&self, scope: impl Into<String>) -> ScopedTokenIssuer<'_, I> {
        ScopedTokenIssuer {
            issuer: self,
            scope: scope.into(),
        }
    }
}

/// [`CachingTokenIssuer`] view bound to one viewer scope.
pub struct ScopedTokenIssuer<'a, I> {
    issuer: &'a CachingTokenIssuer<I>,
    scope: String,
}

impl<I: TokenIssuer> TokenIssuer for ScopedTokenIssuer<'_, I> {
    async fn issue_read_token(
        &self,
        container: &str,
    ) -> Result<ContainerReadToken, TokenIssueError> {
        let key = CacheKey {
            scope: self.scope.clone(),
            container: container.to_string(),
        };
        if let Some(token) = self.issuer.cache.get(&key).await {
            return Ok(token);
        }

        debug!(scope = %self.scope, container = %container, "Issuing container read token");
        let token = self.issuer.inner.issue_read_token(container).await?;
        if token.token.is_some() {
            self.issuer.cache.insert(key, token.clone()).await;
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingIssuer {
        calls: AtomicUsize,
        fail: bool,
        ttl: chrono::Duration,
        /// Grant pattern by call number; `None` entries deny.
        grants: Mutex<Vec<Option<&'static str>>>,
    }

    impl CountingIssuer {
        fn new(ttl: chrono::Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                ttl,
                grants: Mutex::new(Vec::new()),
            }
        }

        fn with_grants(grants: Vec<Option<&'static str>>) -> Self {
            let issuer = Self::new(chrono::Duration::hours(1));
            *issuer.grants.lock().unwrap() = grants;
            issuer
        }
    }

    impl TokenIssuer for CountingIssuer {
        async fn issue_read_token(
            &self,
            container: &str,
        ) -> Result<ContainerReadToken, TokenIssueError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TokenIssueError::unavailable("down"));
            }
            let token = {
                let mut grants = self.grants.lock().unwrap();
                if grants.is_empty() {
                    Some(format!("sig={container}"))
                } else {
                    grants.remove(0).map(String::from)
                }
            };
            let now = Utc::now();
            Ok(ContainerReadToken {
                token,
                container_name: container.to_string(),
                expires_on: now + self.ttl,
                generated_at: now,
            })
        }
    }

    #[tokio::test]
    async fn test_cache_reuses_token_within_scope() {
        let issuer = CachingTokenIssuer::new(CountingIssuer::new(chrono::Duration::hours(1)));

        let first = issuer.scoped("viewer-a").issue_read_token("content").await.unwrap();
        let second = issuer.scoped("viewer-a").issue_read_token("content").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_is_per_container() {
        let issuer = CachingTokenIssuer::new(CountingIssuer::new(chrono::Duration::hours(1)));
        let scoped = issuer.scoped("viewer-a");

        let content = scoped.issue_read_token("content").await.unwrap();
        let files = scoped.issue_read_token("user-files").await.unwrap();

        assert_eq!(content.token.as_deref(), Some("sig=content"));
        assert_eq!(files.token.as_deref(), Some("sig=user-files"));
        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_grant_is_not_shared_across_scopes() {
        let issuer = CachingTokenIssuer::new(CountingIssuer::with_grants(vec![
            Some("sig=granted"),
            None,
        ]));

        let a = issuer.scoped("viewer-a").issue_read_token("user-files").await.unwrap();
        let b = issuer.scoped("viewer-b").issue_read_token("user-files").await.unwrap();

        assert_eq!(a.token.as_deref(), Some("sig=granted"));
        assert_eq!(b.token, None);
        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_denials_are_not_cached() {
        let issuer = CachingTokenIssuer::new(CountingIssuer::with_grants(vec![
            None,
            Some("sig=granted"),
        ]));
        let scoped = issuer.scoped("viewer-a");

        let denied = scoped.issue_read_token("user-files").await.unwrap();
        let granted = scoped.issue_read_token("user-files").await.unwrap();

        assert_eq!(denied.token, None);
        assert_eq!(granted.token.as_deref(), Some("sig=granted"));
        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nearly_expired_token_is_not_reused() {
        let issuer = CachingTokenIssuer::new(CountingIssuer::new(chrono::Duration::seconds(30)));
        let scoped = issuer.scoped("viewer-a");

        scoped.issue_read_token("content").await.unwrap();
        issuer.cache.run_pending_tasks().await;
        scoped.issue_read_token("content").await.unwrap();

        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut inner = CountingIssuer::new(chrono::Duration::hours(1));
        inner.fail = true;
        let issuer = CachingTokenIssuer::new(inner);
        let scoped = issuer.scoped("viewer-a");

        assert!(scoped.issue_read_token("content").await.is_err());
        assert!(scoped.issue_read_token("content").await.is_err());
        assert_eq!(issuer.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_token_set_lookup() {
        let now = Utc::now();
        let token = ContainerReadToken {
            token: None,
            container_name: "content".to_string(),
            expires_on: now,
            generated_at: now,
        };
        let set = ReadTokenSet {
            user_files: Err(TokenIssueError::unavailable("x")),
            content: Ok(token.clone()),
        };
        assert_eq!(set.get(ContainerKind::Content), &Ok(token));
        assert!(set.get(ContainerKind::UserFiles).is_err());
    }

    #[test]
    fn test_token_wire_format() {
        let json = r#"{"token":null,"containerName":"user-files","expiresOn":"2026-01-01T00:00:00Z","generatedAt":"2025-12-31T23:00:00Z"}"#;
        let token: ContainerReadToken = serde_json::from_str(json).unwrap();
        assert!(token.token.is_none());
        assert_eq!(token.container_name, "user-files");
    }
}
