//! File value types and the submission context.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use formvault_shared::{AppError, IdentifierKind, validate_identifier};
use serde::{Deserialize, Serialize};

/// A stored file as the rendering engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedFile {
    /// Canonical object URL, without credentials.
    pub content: String,
    /// Original file name.
    pub name: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Legacy per-file token carried by older stored values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// A file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    /// Create an upload file.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Listener fired when the server assigns a new submission id.
pub type SubmissionIdListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Form and submission the files belong to.
#[derive(Clone)]
pub struct SubmissionContext {
    /// Form identifier.
    pub form_id: String,
    /// Current submission identifier, if one exists yet.
    pub submission_id: Option<String>,
    /// Form locale, forwarded to the endpoints.
    pub locale: String,
    on_submission_id_change: Option<SubmissionIdListener>,
}

impl fmt::Debug for SubmissionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionContext")
            .field("form_id", &self.form_id)
            .field("submission_id", &self.submission_id)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl SubmissionContext {
    /// Create a context for a form.
    #[must_use]
    pub fn new(form_id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            submission_id: None,
            locale: locale.into(),
            on_submission_id_change: None,
        }
    }

    /// Set the current submission id.
    #[must_use]
    pub fn with_submission_id(mut self, submission_id: impl Into<String>) -> Self {
        self.submission_id = Some(submission_id.into());
        self
    }

    /// Set the submission id change listener.
    #[must_use]
    pub fn on_submission_id_change(mut self, listener: SubmissionIdListener) -> Self {
        self.on_submission_id_change = Some(listener);
        self
    }

    /// Validate identifiers before they reach any request.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_identifier(IdentifierKind::FormId, &self.form_id)?;
        if let Some(submission_id) = &self.submission_id {
            validate_identifier(IdentifierKind::SubmissionId, submission_id)?;
        }
        Ok(())
    }

    /// Fire the listener if `new_id` differs from the current submission id.
    pub(crate) fn notify_submission_id(&self, new_id: &str) -> bool {
        if self.submission_id.as_deref() == Some(new_id) {
            return false;
        }
        if let Some(listener) = &self.on_submission_id_change {
            listener(new_id);
        }
        true
    }
}
