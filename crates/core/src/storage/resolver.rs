//! Storage URL resolution.
//!
//! Both enrichment paths (rendered DOM and declarative trees) go through
//! `StorageUrlResolver::resolve`, so they cannot disagree about which URLs
//! get a token.

use std::sync::Arc;

use tracing::debug;
use url::{Url, form_urlencoded};

use super::config::StorageConfig;
use super::token::ReadTokenSet;

/// Asset shown in place of an object the viewer may not read.
pub const ACCESS_NOT_ALLOWED_IMAGE: &str = "/images/access-not-allowed.svg";

/// Rewrites storage URLs into token-qualified URLs.
#[derive(Debug, Clone)]
pub struct StorageUrlResolver {
    config: Arc<StorageConfig>,
    tokens: Arc<ReadTokenSet>,
}

impl StorageUrlResolver {
    /// Create a resolver from a storage config and resolved tokens.
    #[must_use]
    pub fn new(config: Arc<StorageConfig>, tokens: Arc<ReadTokenSet>) -> Self {
        Self { config, tokens }
    }

    /// Resolve a candidate URL.
    ///
    /// - Nothing is rewritten unless the storage config requires tokens.
    /// - Foreign hosts, `data:` URLs, relative URLs and paths outside the
    ///   known containers pass through unchanged.
    /// - A container whose token issuance failed also passes through.
    /// - A container whose token is `None` (access denied) yields
    ///   [`ACCESS_NOT_ALLOWED_IMAGE`].
    /// - Otherwise the token is appended to the query string, unless every
    ///   one of its parameters is already there.
    #[must_use]
    pub fn resolve(&self, url: &str) -> String {
        if !self.config.requires_tokens() {
            return url.to_string();
        }
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };

        if parsed.host_str() != Some(self.config.host_name.as_str()) {
            return url.to_string();
        }
        if parsed.scheme().eq_ignore_ascii_case("data") {
            return url.to_string();
        }

        let Some(kind) = parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .and_then(|container| self.config.container_names.kind_of(container))
        else {
            return url.to_string();
        };

        let token = match self.tokens.get(kind) {
            Ok(read_token) => read_token.token.as_deref(),
            Err(e) => {
                debug!(container = ?kind, error = %e, "No token available, leaving URL untouched");
                return url.to_string();
            }
        };

        let Some(token) = token.map(|t| t.trim_start_matches('?')) else {
            return ACCESS_NOT_ALLOWED_IMAGE.to_string();
        };
        if token.is_empty() {
            return url.to_string();
        }

        let query = match parsed.query() {
            Some(existing) if carries_token(existing, token) => return url.to_string(),
            Some(existing) if !existing.is_empty() => format!("{existing}&{token}"),
            _ => token.to_string(),
        };
        parsed.set_query(Some(&query));
        parsed.to_string()
    }

    /// Borrow the resolver as a plain `Fn(&str) -> String`.
    pub fn as_fn(&self) -> impl Fn(&str) -> String + '_ {
        move |url| self.resolve(url)
    }

    /// The storage config this resolver enforces.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// The tokens this resolver applies.
    #[must_use]
    pub fn tokens(&self) -> &Arc<ReadTokenSet> {
        &self.tokens
    }
}

/// Every `name=value` pair of `token` is already present in `query`.
fn carries_token(query: &str, token: &str) -> bool {
    let existing: Vec<_> = form_urlencoded::parse(query.as_bytes()).collect();
    form_urlencoded::parse(token.as_bytes()).all(|pair| existing.contains(&pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContainerNames, ContainerReadToken, TokenIssueError};
    use chrono::Utc;
    use proptest::prelude::*;

    const HOST: &str = "acme.blob.core.windows.net";

    fn config() -> Arc<StorageConfig> {
        config_with(true)
    }

    fn config_with(is_private: bool) -> Arc<StorageConfig> {
        Arc::new(StorageConfig {
            is_enabled: true,
            is_private,
            host_name: HOST.to_string(),
            container_names: ContainerNames {
                user_files: "user-files".to_string(),
                content: "content".to_string(),
            },
        })
    }

    fn token(container: &str, value: Option<&str>) -> ContainerReadToken {
        let now = Utc::now();
        ContainerReadToken {
            token: value.map(String::from),
            container_name: container.to_string(),
            expires_on: now + chrono::Duration::hours(1),
            generated_at: now,
        }
    }

    fn resolver(user_files: Option<&str>, content: Option<&str>) -> StorageUrlResolver {
        StorageUrlResolver::new(
            config(),
            Arc::new(ReadTokenSet {
                user_files: Ok(token("user-files", user_files)),
                content: Ok(token("content", content)),
            }),
        )
    }

    #[test]
    fn test_appends_token_for_matching_container() {
        let r = resolver(Some("sv=1&sig=u"), Some("sv=1&sig=c"));
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/content/logo.png"),
            "https://acme.blob.core.windows.net/content/logo.png?sv=1&sig=c"
        );
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/user-files/a/b.jpg"),
            "https://acme.blob.core.windows.net/user-files/a/b.jpg?sv=1&sig=u"
        );
    }

    #[test]
    fn test_strips_leading_question_mark() {
        let r = resolver(Some("?sig=u"), Some("sig=c"));
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/user-files/x.png"),
            "https://acme.blob.core.windows.net/user-files/x.png?sig=u"
        );
    }

    #[test]
    fn test_merges_with_existing_query() {
        let r = resolver(Some("sig=u"), Some("sig=c"));
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/content/x.png?v=2"),
            "https://acme.blob.core.windows.net/content/x.png?v=2&sig=c"
        );
    }

    #[test]
    fn test_resolving_twice_is_stable() {
        let r = resolver(Some("sig=u"), Some("sig=c"));
        let once = r.resolve("https://acme.blob.core.windows.net/content/x.png");
        assert_eq!(r.resolve(&once), once);
    }

    #[test]
    fn test_public_storage_is_never_rewritten() {
        let r = StorageUrlResolver::new(
            config_with(false),
            Arc::new(ReadTokenSet {
                user_files: Ok(token("user-files", None)),
                content: Ok(token("content", Some("sig=c"))),
            }),
        );
        for url in [
            "https://acme.blob.core.windows.net/content/x.png",
            "https://acme.blob.core.windows.net/user-files/a.png",
        ] {
            assert_eq!(r.resolve(url), url);
        }
    }

    #[test]
    fn test_similar_query_parameter_still_gets_token() {
        let r = resolver(Some("sig=u"), Some("sig=ab"));
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/content/x.png?xsig=abc"),
            "https://acme.blob.core.windows.net/content/x.png?xsig=abc&sig=ab"
        );
    }

    #[test]
    fn test_multi_parameter_token_not_appended_twice() {
        let r = resolver(Some("sv=1&sig=u"), Some("sig=c"));
        let url = "https://acme.blob.core.windows.net/user-files/a.png?sig=u&v=3&sv=1";
        assert_eq!(r.resolve(url), url);
    }

    #[test]
    fn test_foreign_host_untouched() {
        let r = resolver(Some("sig=u"), Some("sig=c"));
        let url = "https://evil.example.com/content/x.png";
        assert_eq!(r.resolve(url), url);
    }

    #[test]
    fn test_data_url_untouched() {
        let r = resolver(Some("sig=u"), Some("sig=c"));
        let url = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(r.resolve(url), url);
    }

    #[test]
    fn test_relative_and_unknown_container_untouched() {
        let r = resolver(Some("sig=u"), Some("sig=c"));
        assert_eq!(r.resolve("/images/logo.png"), "/images/logo.png");
        let other = "https://acme.blob.core.windows.net/backups/x.png";
        assert_eq!(r.resolve(other), other);
    }

    #[test]
    fn test_null_token_yields_placeholder() {
        let r = resolver(None, Some("sig=c"));
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/user-files/a.png"),
            ACCESS_NOT_ALLOWED_IMAGE
        );
        assert_eq!(
            r.resolve("https://acme.blob.core.windows.net/content/b.png"),
            "https://acme.blob.core.windows.net/content/b.png?sig=c"
        );
    }

    #[test]
    fn test_failed_issuance_untouched() {
        let r = StorageUrlResolver::new(
            config(),
            Arc::new(ReadTokenSet {
                user_files: Err(TokenIssueError::unavailable("timeout")),
                content: Ok(token("content", Some("sig=c"))),
            }),
        );
        let url = "https://acme.blob.core.windows.net/user-files/a.png";
        assert_eq!(r.resolve(url), url);
    }

    proptest! {
        // A URL on any other host is never rewritten, whatever the tokens.
        #[test]
        fn prop_foreign_hosts_never_rewritten(
            host in "[a-z]{1,12}\\.(com|net|org)",
            container in prop::sample::select(vec!["content", "user-files"]),
            path in "[a-z0-9]{1,16}\\.png",
        ) {
            let r = resolver(Some("sig=u"), None);
            let url = format!("https://{host}/{container}/{path}");
            prop_assert_eq!(r.resolve(&url), url);
        }

        // A denied container always maps to the placeholder, whatever the path.
        #[test]
        fn prop_denied_token_always_placeholder(path in "[a-zA-Z0-9_/-]{1,40}") {
            let r = resolver(None, None);
            let url = format!("https://{HOST}/user-files/{path}");
            prop_assert_eq!(r.resolve(&url), ACCESS_NOT_ALLOWED_IMAGE);
        }
    }
}
