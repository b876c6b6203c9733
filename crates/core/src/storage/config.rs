//! Storage capability descriptor.

use formvault_shared::StorageSettings;
use serde::{Deserialize, Serialize};

/// Azure blob endpoint suffix used when only an account name is configured.
const BLOB_HOST_SUFFIX: &str = "blob.core.windows.net";

/// Logical container names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerNames {
    /// Container for end-user uploads.
    pub user_files: String,
    /// Container for form content.
    pub content: String,
}

/// Which logical container a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// End-user uploads.
    UserFiles,
    /// Form content.
    Content,
}

impl ContainerNames {
    /// Get the name of a logical container.
    #[must_use]
    pub fn name(&self, kind: ContainerKind) -> &str {
        match kind {
            ContainerKind::UserFiles => &self.user_files,
            ContainerKind::Content => &self.content,
        }
    }

    /// Map a container name (first URL path segment) to its logical container.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<ContainerKind> {
        if name == self.user_files {
            Some(ContainerKind::UserFiles)
        } else if name == self.content {
            Some(ContainerKind::Content)
        } else {
            None
        }
    }
}

/// Process-wide storage capability descriptor.
///
/// Built once per request/session and passed explicitly. When `is_enabled` or
/// `is_private` is false nothing downstream resolves tokens or rewrites URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage is configured for this tenant.
    pub is_enabled: bool,
    /// Object URLs require a read token.
    pub is_private: bool,
    /// The only host whose URLs may be rewritten.
    pub host_name: String,
    /// Logical container names.
    pub container_names: ContainerNames,
}

impl StorageConfig {
    /// Whether URLs must be enriched with read tokens.
    #[must_use]
    pub fn requires_tokens(&self) -> bool {
        self.is_enabled && self.is_private
    }
}

/// Whether an optional config demands token enrichment.
///
/// A missing config behaves exactly like a disabled one.
#[must_use]
pub fn is_protected(config: Option<&StorageConfig>) -> bool {
    config.is_some_and(StorageConfig::requires_tokens)
}

/// Resolve tenant storage settings into a `StorageConfig`.
///
/// Pure function: no I/O. Returns `None` when storage is not enabled or no
/// host can be determined, which downstream code treats as disabled.
#[must_use]
pub fn resolve_storage_config(settings: &StorageSettings) -> Option<StorageConfig> {
    if !settings.enabled {
        return None;
    }

    let host_name = settings
        .host_name
        .clone()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            settings
                .account_name
                .as_deref()
                .filter(|a| !a.is_empty())
                .map(|account| format!("{account}.{BLOB_HOST_SUFFIX}"))
        })?;

    Some(StorageConfig {
        is_enabled: true,
        is_private: settings.private,
        host_name: host_name.to_ascii_lowercase(),
        container_names: ContainerNames {
            user_files: settings.user_files_container.clone(),
            content: settings.content_container.clone(),
        },
    })
}
