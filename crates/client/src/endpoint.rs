//! Endpoint URL construction.

use formvault_core::files::TransportError;
use url::Url;

const UPLOAD_PATH: &str = "api/upload";
const SAS_PATH: &str = "api/upload/sas-tokens";
const DELETE_PATH: &str = "api/upload/files";
const READ_TOKEN_PATH: &str = "api/storage/read-token";

/// Application API endpoints, relative to one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base: Url,
}

impl ApiEndpoints {
    /// Parse the API base URL.
    ///
    /// Only `http` and `https` bases are accepted. A path on the base is
    /// kept, so `https://host/forms` yields `https://host/forms/api/upload`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let mut base = Url::parse(base_url.trim())
            .map_err(|e| TransportError::InvalidRequest(format!("invalid API base URL: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(TransportError::InvalidRequest(format!(
                "unsupported API base URL scheme: {}",
                base.scheme()
            )));
        }
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Proxy upload endpoint.
    pub fn upload(&self) -> Result<Url, TransportError> {
        self.join(UPLOAD_PATH)
    }

    /// Pre-signed write URL endpoint.
    pub fn sas_tokens(&self) -> Result<Url, TransportError> {
        self.join(SAS_PATH)
    }

    /// Delete endpoint.
    pub fn delete_files(&self) -> Result<Url, TransportError> {
        self.join(DELETE_PATH)
    }

    /// Read token endpoint for one container.
    pub fn read_token(&self, container: &str) -> Result<Url, TransportError> {
        let mut url = self.join(READ_TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("container", container);
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid endpoint path: {e}")))
    }
}
