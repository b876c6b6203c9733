//! Upload orchestration.
//!
//! Files are split into a proxy batch and a direct batch, both batches run
//! concurrently, and the results are put back in the caller's order before
//! the single callback fires.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::policy::{
    ThresholdRoutePolicy, UploadClassification, UploadRoute, UploadRoutePolicy, classify,
};
use super::transport::{ProxyUploadResponse, UploadTransport, WriteUrlEntry};
use super::types::{ProtectedFile, SubmissionContext, UploadFile};

/// Outcome of one file, tagged with its original position.
type FileOutcome = (usize, Result<ProtectedFile, String>);

/// Drives proxy and direct uploads.
pub struct UploadOrchestrator<T, P = ThresholdRoutePolicy> {
    transport: Arc<T>,
    policy: P,
}

impl<T: UploadTransport, P: UploadRoutePolicy> UploadOrchestrator<T, P> {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(transport: Arc<T>, policy: P) -> Self {
        Self { transport, policy }
    }

    /// Classify files with this orchestrator's policy.
    #[must_use]
    pub fn classify<'a>(&self, files: &'a [UploadFile]) -> Vec<UploadClassification<'a>> {
        classify(&self.policy, files)
    }

    /// Upload files and report through `callback(results, errors)`.
    ///
    /// The callback fires exactly once. Results are in the order of `files`;
    /// a file that failed appears in `errors` instead. One batch failing
    /// never hides results of the other.
    pub async fn upload_files<C>(
        &self,
        ctx: &SubmissionContext,
        files: Vec<UploadFile>,
        callback: C,
    ) where
        C: FnOnce(Vec<ProtectedFile>, Vec<String>),
    {
        if files.is_empty() {
            callback(Vec::new(), Vec::new());
            return;
        }
        if let Err(e) = ctx.validate() {
            warn!(error = %e, "Rejected upload request");
            callback(Vec::new(), vec![e.to_string()]);
            return;
        }

        let (proxy, direct): (Vec<_>, Vec<_>) = self
            .classify(&files)
            .into_iter()
            .partition(|c| c.route == UploadRoute::Proxy);
        let proxy: Vec<usize> = proxy.iter().map(|c| c.index).collect();
        let direct: Vec<usize> = direct.iter().map(|c| c.index).collect();

        info!(
            form_id = %ctx.form_id,
            proxy_count = proxy.len(),
            direct_count = direct.len(),
            "Uploading files"
        );

        let ((proxy_outcomes, new_submission_id), direct_outcomes) = tokio::join!(
            self.upload_proxy_batch(ctx, &files, &proxy),
            self.upload_direct_batch(ctx, &files, &direct),
        );

        if let Some(new_id) = new_submission_id {
            ctx.notify_submission_id(&new_id);
        }

        let mut outcomes: Vec<FileOutcome> =
            proxy_outcomes.into_iter().chain(direct_outcomes).collect();
        outcomes.sort_by_key(|(index, _)| *index);

        let mut results = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(file) => results.push(file),
                Err(e) => errors.push(e),
            }
        }

        callback(results, errors);
    }

    async fn upload_proxy_batch(
        &self,
        ctx: &SubmissionContext,
        files: &[UploadFile],
        indices: &[usize],
    ) -> (Vec<FileOutcome>, Option<String>) {
        if indices.is_empty() {
            return (Vec::new(), None);
        }

        let batch: Vec<UploadFile> = indices.iter().map(|&i| files[i].clone()).collect();
        let response = match self.transport.upload_via_proxy(ctx, &batch).await {
            Ok(response) => response,
            Err(e) => {
                warn!(route = "proxy", error = %e, "Upload batch failed");
                return (fail_all(files, indices, &e.to_string()), None);
            }
        };

        let ProxyUploadResponse {
            files: mut returned,
            submission_id,
            error,
        } = response;

        if let Some(error) = error {
            warn!(route = "proxy", error = %error, "Upload endpoint reported an error");
            return (fail_all(files, indices, &error), submission_id);
        }

        let outcomes = indices
            .iter()
            .map(|&i| {
                let file = &files[i];
                let position = returned.iter().position(|r| r.name == file.name);
                let outcome = match position {
                    Some(pos) => Ok(stored_file(file, returned.remove(pos).url)),
                    None => Err(format!("{}: no URL returned for uploaded file", file.name)),
                };
                (i, outcome)
            })
            .collect();

        (outcomes, submission_id)
    }

    async fn upload_direct_batch(
        &self,
        ctx: &SubmissionContext,
        files: &[UploadFile],
        indices: &[usize],
    ) -> Vec<FileOutcome> {
        if indices.is_empty() {
            return Vec::new();
        }

        let names: Vec<String> = indices.iter().map(|&i| files[i].name.clone()).collect();
        let write_urls = match self.transport.request_write_urls(ctx, &names).await {
            Ok(response) => response.sas_tokens,
            Err(e) => {
                warn!(route = "direct", error = %e, "Upload batch failed");
                return fail_all(files, indices, &e.to_string());
            }
        };

        let uploads = indices.iter().map(|&i| {
            let file = &files[i];
            let entry = write_urls.get(&file.name);
            async move {
                let Some(WriteUrlEntry {
                    success: true,
                    url: Some(url),
                }) = entry
                else {
                    return (i, Err(format!("{}: no upload URL issued", file.name)));
                };

                match self.transport.put_blob(url, file).await {
                    Ok(()) => (i, Ok(stored_file(file, strip_query(url).to_string()))),
                    Err(e) => {
                        warn!(route = "direct", file = %file.name, error = %e, "Blob upload failed");
                        (i, Err(format!("{}: {e}", file.name)))
                    }
                }
            }
        });

        join_all(uploads).await
    }
}

fn stored_file(file: &UploadFile, url: String) -> ProtectedFile {
    ProtectedFile {
        content: url,
        name: file.name.clone(),
        file_type: file.mime_type.clone(),
        token: None,
    }
}

fn fail_all(files: &[UploadFile], indices: &[usize], error: &str) -> Vec<FileOutcome> {
    indices
        .iter()
        .map(|&i| (i, Err(format!("{}: {error}", files[i].name))))
        .collect()
}

/// Drop the query string (the write credential) from a pre-signed URL.
fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
