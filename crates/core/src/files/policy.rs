//! Upload route classification.

use formvault_shared::StorageSettings;

use super::types::UploadFile;

/// Which transport a file takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    /// Multipart upload through the application server, which resizes images.
    Proxy,
    /// Straight to a pre-signed storage URL, bypassing the server.
    Direct,
}

/// Decides the route of a file from its MIME type and size.
pub trait UploadRoutePolicy: Send + Sync {
    /// Route for a file.
    fn route(&self, mime_type: &str, size: u64) -> UploadRoute;
}

/// Small images go through the proxy; everything else goes direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdRoutePolicy {
    /// Images strictly below this many bytes are proxied.
    pub proxy_image_max_bytes: u64,
}

impl ThresholdRoutePolicy {
    /// Default threshold: 20MB.
    pub const DEFAULT_PROXY_IMAGE_MAX_BYTES: u64 = 20 * 1024 * 1024;

    /// Build from tenant storage settings.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self {
            proxy_image_max_bytes: settings.proxy_image_max_bytes,
        }
    }
}

impl Default for ThresholdRoutePolicy {
    fn default() -> Self {
        Self {
            proxy_image_max_bytes: Self::DEFAULT_PROXY_IMAGE_MAX_BYTES,
        }
    }
}

impl UploadRoutePolicy for ThresholdRoutePolicy {
    fn route(&self, mime_type: &str, size: u64) -> UploadRoute {
        let is_image = mime_type.to_ascii_lowercase().starts_with("image/");
        if is_image && size < self.proxy_image_max_bytes {
            UploadRoute::Proxy
        } else {
            UploadRoute::Direct
        }
    }
}

/// A file with its position in the caller's list and its route.
#[derive(Debug, Clone, Copy)]
pub struct UploadClassification<'a> {
    /// Position in the original file list.
    pub index: usize,
    /// The file.
    pub file: &'a UploadFile,
    /// Chosen route.
    pub route: UploadRoute,
}

/// Classify files, preserving their order.
pub fn classify<'a, P: UploadRoutePolicy + ?Sized>(
    policy: &P,
    files: &'a [UploadFile],
) -> Vec<UploadClassification<'a>> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| UploadClassification {
            index,
            file,
            route: policy.route(&file.mime_type, file.size()),
        })
        .collect()
}
