//! File transports over HTTP.

use std::time::Duration;

use formvault_core::files::{
    DeleteFilesRequest, DeleteFilesResponse, DeleteTransport, ProxyUploadResponse,
    SubmissionContext, TransportError, UploadFile, UploadTransport, WriteUrlsRequest,
    WriteUrlsResponse,
};
use formvault_shared::StorageSettings;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use crate::USER_AGENT;
use crate::endpoint::ApiEndpoints;
use crate::response::{ensure_success, network_error, read_json};

/// Header carrying the form id on proxy uploads.
pub const FORM_ID_HEADER: &str = "x-form-id";
/// Header carrying the submission id on proxy uploads.
pub const SUBMISSION_ID_HEADER: &str = "x-submission-id";
/// Header carrying the form locale on proxy uploads.
pub const FORM_LOCALE_HEADER: &str = "x-form-locale";

const BLOB_TYPE_HEADER: &str = "x-ms-blob-type";
const BLOCK_BLOB: &str = "BlockBlob";
const MULTIPART_FIELD: &str = "files";

/// Uploads can carry large files; keep the timeout generous.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Upload, SAS, delete and blob transports against the application API.
#[derive(Debug, Clone)]
pub struct HttpFileTransport {
    client: reqwest::Client,
    endpoints: ApiEndpoints,
}

impl HttpFileTransport {
    /// Create a transport for the given API base URL.
    pub fn new(api_base_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_client(client, ApiEndpoints::new(api_base_url)?))
    }

    /// Create a transport from storage settings.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, TransportError> {
        Self::new(&settings.api_base_url)
    }

    /// Create a transport around an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoints: ApiEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Endpoints this transport talks to.
    #[must_use]
    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }
}

/// Identifiers end up in headers and bodies; check them first.
fn checked(ctx: &SubmissionContext) -> Result<(), TransportError> {
    ctx.validate()
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

fn multipart_form(files: &[UploadFile]) -> Result<Form, TransportError> {
    files.iter().try_fold(Form::new(), |form, file| {
        let part = Part::bytes(file.data.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| {
                TransportError::InvalidRequest(format!("{}: invalid MIME type: {e}", file.name))
            })?;
        Ok(form.part(MULTIPART_FIELD, part))
    })
}

impl UploadTransport for HttpFileTransport {
    async fn upload_via_proxy(
        &self,
        ctx: &SubmissionContext,
        files: &[UploadFile],
    ) -> Result<ProxyUploadResponse, TransportError> {
        checked(ctx)?;
        let url = self.endpoints.upload()?;
        let form = multipart_form(files)?;
        debug!(url = %url, file_count = files.len(), "Posting proxy upload");

        let mut request = self
            .client
            .post(url)
            .header(FORM_ID_HEADER, &ctx.form_id)
            .header(FORM_LOCALE_HEADER, &ctx.locale)
            .multipart(form);
        if let Some(submission_id) = &ctx.submission_id {
            request = request.header(SUBMISSION_ID_HEADER, submission_id);
        }

        let response = request.send().await.map_err(|e| network_error(&e))?;
        read_json(response).await
    }

    async fn request_write_urls(
        &self,
        ctx: &SubmissionContext,
        file_names: &[String],
    ) -> Result<WriteUrlsResponse, TransportError> {
        checked(ctx)?;
        let url = self.endpoints.sas_tokens()?;
        let body = WriteUrlsRequest {
            file_names: file_names.to_vec(),
            submission_id: ctx.submission_id.clone(),
            form_id: ctx.form_id.clone(),
            form_locale: ctx.locale.clone(),
        };
        debug!(url = %url, file_count = file_names.len(), "Requesting write URLs");

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        read_json(response).await
    }

    async fn put_blob(&self, url: &str, file: &UploadFile) -> Result<(), TransportError> {
        let target = Url::parse(url)
            .map_err(|e| TransportError::InvalidRequest(format!("invalid upload URL: {e}")))?;
        if target.scheme() != "https" && target.scheme() != "http" {
            return Err(TransportError::InvalidRequest(format!(
                "unsupported upload URL scheme: {}",
                target.scheme()
            )));
        }
        debug!(file = %file.name, size = file.size(), "Uploading blob");

        let response = self
            .client
            .put(target)
            .header(BLOB_TYPE_HEADER, BLOCK_BLOB)
            .header(CONTENT_TYPE, &file.mime_type)
            .body(file.data.clone())
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        ensure_success(response).await.map(|_| ())
    }
}

impl DeleteTransport for HttpFileTransport {
    async fn delete_files(
        &self,
        ctx: &SubmissionContext,
        file_urls: &[String],
    ) -> Result<DeleteFilesResponse, TransportError> {
        checked(ctx)?;
        let url = self.endpoints.delete_files()?;
        let body = DeleteFilesRequest {
            form_id: ctx.form_id.clone(),
            submission_id: ctx.submission_id.clone(),
            file_urls: file_urls.to_vec(),
        };
        debug!(url = %url, file_count = file_urls.len(), "Deleting files");

        let response = self
            .client
            .delete(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        read_json(response).await
    }
}
