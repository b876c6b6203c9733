//! Per-session read token resolution.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::config::{StorageConfig, is_protected};
use super::error::TokenIssueError;
use super::resolver::StorageUrlResolver;
use super::token::{ContainerReadToken, ReadTokenSet, TokenIssuer};
use crate::render::{RenderModel, UnregisterHandle, register_view_handlers};

/// Read tokens resolved for one rendering session.
///
/// Holds no tokens when storage is absent, disabled or public; every
/// operation is then a no-op.
#[derive(Debug, Clone)]
pub struct ReadTokenProvider {
    config: Option<Arc<StorageConfig>>,
    tokens: Option<Arc<ReadTokenSet>>,
}

impl ReadTokenProvider {
    /// Resolve both container tokens.
    ///
    /// The two futures are joined, not raced: both settle before this
    /// returns, and a failure in one never prevents the other from
    /// resolving. When storage is not private neither future is polled.
    pub async fn resolve<U, C>(config: Option<Arc<StorageConfig>>, user_files: U, content: C) -> Self
    where
        U: Future<Output = Result<ContainerReadToken, TokenIssueError>>,
        C: Future<Output = Result<ContainerReadToken, TokenIssueError>>,
    {
        if !is_protected(config.as_deref()) {
            return Self::unprotected(config);
        }

        let (user_files, content) = tokio::join!(user_files, content);

        for (container, result) in [("user_files", &user_files), ("content", &content)] {
            match result {
                Ok(token) if token.token.is_none() => {
                    debug!(container, "Read access denied for container");
                }
                Ok(_) => {}
                Err(e) => warn!(container, error = %e, "Failed to resolve container read token"),
            }
        }

        Self {
            config,
            tokens: Some(Arc::new(ReadTokenSet {
                user_files,
                content,
            })),
        }
    }

    /// Resolve both container tokens through an issuer.
    pub async fn issue<I: TokenIssuer>(config: Option<Arc<StorageConfig>>, issuer: &I) -> Self {
        let Some(cfg) = config.clone().filter(|c| c.requires_tokens()) else {
            return Self::unprotected(config);
        };
        let names = &cfg.container_names;
        Self::resolve(
            config.clone(),
            issuer.issue_read_token(&names.user_files),
            issuer.issue_read_token(&names.content),
        )
        .await
    }

    /// Provider that never enriches anything.
    #[must_use]
    pub fn unprotected(config: Option<Arc<StorageConfig>>) -> Self {
        Self {
            config,
            tokens: None,
        }
    }

    /// Resolved tokens, if storage is private.
    #[must_use]
    pub fn tokens(&self) -> Option<&Arc<ReadTokenSet>> {
        self.tokens.as_ref()
    }

    /// Build the URL resolver for this session, if storage is private.
    #[must_use]
    pub fn url_resolver(&self) -> Option<StorageUrlResolver> {
        let config = self.config.as_ref()?;
        let tokens = self.tokens.as_ref()?;
        Some(StorageUrlResolver::new(Arc::clone(config), Arc::clone(tokens)))
    }

    /// Attach the resolved tokens to the render model's side channel.
    ///
    /// No-op when storage is not private. The slot is write-once; a second
    /// attachment is ignored.
    pub fn set_model_metadata(&self, model: &RenderModel) {
        if let Some(tokens) = &self.tokens
            && !model.attach_read_tokens(Arc::clone(tokens))
        {
            debug!("Render model already carries read tokens");
        }
    }

    /// Subscribe the view handlers to the render model.
    ///
    /// Always returns a handle that is safe to call, even when nothing was
    /// subscribed.
    pub fn register_view_handlers(&self, model: &Arc<RenderModel>) -> UnregisterHandle {
        match self.url_resolver() {
            Some(resolver) => register_view_handlers(model, Arc::new(resolver)),
            None => UnregisterHandle::noop(),
        }
    }
}
