//! Transport seam and wire types for the file endpoints.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::error::TransportError;
use super::types::{SubmissionContext, UploadFile};

/// File returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFileRef {
    /// File name as uploaded.
    pub name: String,
    /// Canonical stored URL.
    pub url: String,
}

/// Upload endpoint response: `{ files, submissionId? }` or `{ error }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyUploadResponse {
    /// Stored files.
    #[serde(default)]
    pub files: Vec<UploadedFileRef>,
    /// Submission id assigned by the server.
    #[serde(default)]
    pub submission_id: Option<String>,
    /// Batch-level failure.
    #[serde(default)]
    pub error: Option<String>,
}

/// SAS endpoint request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteUrlsRequest {
    /// One pre-signed URL is requested per name.
    pub file_names: Vec<String>,
    /// Current submission id.
    pub submission_id: Option<String>,
    /// Form id.
    pub form_id: String,
    /// Form locale.
    pub form_locale: String,
}

/// One entry of the SAS endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WriteUrlEntry {
    /// Whether a URL was issued.
    pub success: bool,
    /// Pre-signed write URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// SAS endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteUrlsResponse {
    /// Entries keyed by file name.
    #[serde(default)]
    pub sas_tokens: HashMap<String, WriteUrlEntry>,
}

/// Delete endpoint request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFilesRequest {
    /// Form id.
    pub form_id: String,
    /// Current submission id.
    pub submission_id: Option<String>,
    /// Object URLs to delete.
    pub file_urls: Vec<String>,
}

/// Outcome of one deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteStatus {
    /// Object deleted.
    Success,
    /// Object not deleted.
    Error,
}

/// One entry of the delete endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResult {
    /// Object URL.
    pub file_url: String,
    /// Outcome.
    pub result: DeleteStatus,
    /// Error text for failures.
    #[serde(default)]
    pub error: Option<String>,
}

/// Delete endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteFilesResponse {
    /// Per-URL results.
    #[serde(default)]
    pub results: Vec<DeleteFileResult>,
}

/// Upload transports.
///
/// Implemented over HTTP by `formvault-client`.
pub trait UploadTransport: Send + Sync {
    /// Send a batch through the resizing proxy as one multipart request.
    fn upload_via_proxy(
        &self,
        ctx: &SubmissionContext,
        files: &[UploadFile],
    ) -> impl Future<Output = Result<ProxyUploadResponse, TransportError>> + Send;

    /// Request one pre-signed write URL per file name.
    fn request_write_urls(
        &self,
        ctx: &SubmissionContext,
        file_names: &[String],
    ) -> impl Future<Output = Result<WriteUrlsResponse, TransportError>> + Send;

    /// Upload bytes straight to a pre-signed URL.
    fn put_blob(
        &self,
        url: &str,
        file: &UploadFile,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Delete transport.
pub trait DeleteTransport: Send + Sync {
    /// Delete a batch of object URLs.
    fn delete_files(
        &self,
        ctx: &SubmissionContext,
        file_urls: &[String],
    ) -> impl Future<Output = Result<DeleteFilesResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_response_shapes() {
        let ok: ProxyUploadResponse = serde_json::from_str(
            r#"{"files":[{"name":"a.png","url":"https://s/a.png"}],"submissionId":"ab12"}"#,
        )
        .unwrap();
        assert_eq!(ok.files.len(), 1);
        assert_eq!(ok.submission_id.as_deref(), Some("ab12"));

        let err: ProxyUploadResponse = serde_json::from_str(r#"{"error":"too big"}"#).unwrap();
        assert!(err.files.is_empty());
        assert_eq!(err.error.as_deref(), Some("too big"));
    }

    #[test]
    fn test_sas_wire_format() {
        let req = WriteUrlsRequest {
            file_names: vec!["a.pdf".to_string()],
            submission_id: None,
            form_id: "42".to_string(),
            form_locale: "en".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["fileNames"][0], "a.pdf");
        assert_eq!(json["formLocale"], "en");

        let resp: WriteUrlsResponse = serde_json::from_str(
            r#"{"sasTokens":{"a.pdf":{"success":true,"url":"https://s/a.pdf?sig=w"},"b.pdf":{"success":false}}}"#,
        )
        .unwrap();
        assert!(resp.sas_tokens["a.pdf"].success);
        assert!(resp.sas_tokens["b.pdf"].url.is_none());
    }

    #[test]
    fn test_delete_wire_format() {
        let resp: DeleteFilesResponse = serde_json::from_str(
            r#"{"results":[{"fileUrl":"u1","result":"success"},{"fileUrl":"u2","result":"error","error":"locked"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.results[0].result, DeleteStatus::Success);
        assert_eq!(resp.results[1].error.as_deref(), Some("locked"));
    }
}
