//! Delete orchestration.

use std::sync::Arc;

use tracing::{info, warn};

use super::transport::{DeleteStatus, DeleteTransport};
use super::types::{ProtectedFile, SubmissionContext};

/// One callback invocation of [`DeleteOrchestrator::delete_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A file was deleted, or there was nothing to delete.
    Success(Option<ProtectedFile>),
    /// A deletion failed.
    Error(String),
}

/// What to delete.
#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    /// The question's current files.
    pub value: Vec<ProtectedFile>,
    /// Delete only the file with this name.
    pub file_name: Option<String>,
    /// Files are inlined in the submission; nothing was ever stored.
    pub store_data_as_text: bool,
}

/// Deletes stored files in one batch and reports per file.
pub struct DeleteOrchestrator<T> {
    transport: Arc<T>,
}

impl<T: DeleteTransport> DeleteOrchestrator<T> {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Delete files, invoking `callback` once per outcome.
    ///
    /// Several invocations are expected when several files are deleted;
    /// there is no aggregate call at the end.
    pub async fn delete_files<C>(
        &self,
        ctx: &SubmissionContext,
        request: DeleteRequest,
        mut callback: C,
    ) where
        C: FnMut(DeleteOutcome),
    {
        if request.store_data_as_text {
            callback(DeleteOutcome::Success(None));
            return;
        }
        if request.value.is_empty() {
            callback(DeleteOutcome::Error("no files to delete".to_string()));
            return;
        }

        let targets: Vec<&ProtectedFile> = match &request.file_name {
            Some(name) => request.value.iter().filter(|f| &f.name == name).collect(),
            None => request.value.iter().collect(),
        };
        if targets.is_empty() {
            callback(DeleteOutcome::Success(None));
            return;
        }

        if let Err(e) = ctx.validate() {
            warn!(error = %e, "Rejected delete request");
            callback(DeleteOutcome::Error(e.to_string()));
            return;
        }

        let urls: Vec<String> = targets.iter().map(|f| f.content.clone()).collect();
        info!(form_id = %ctx.form_id, file_count = urls.len(), "Deleting files");

        let response = match self.transport.delete_files(ctx, &urls).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Delete request failed");
                callback(DeleteOutcome::Error(e.to_string()));
                return;
            }
        };

        let mut reported = vec![false; targets.len()];
        for result in response.results {
            let position = targets
                .iter()
                .zip(&reported)
                .position(|(f, done)| !done && f.content == result.file_url);
            if let Some(pos) = position {
                reported[pos] = true;
            }

            match result.result {
                DeleteStatus::Success => {
                    callback(DeleteOutcome::Success(position.map(|pos| targets[pos].clone())));
                }
                DeleteStatus::Error => {
                    let message = result
                        .error
                        .unwrap_or_else(|| format!("failed to delete {}", result.file_url));
                    callback(DeleteOutcome::Error(message));
                }
            }
        }

        for (file, _) in targets.iter().zip(&reported).filter(|(_, done)| !**done) {
            callback(DeleteOutcome::Error(format!(
                "no delete result for {}",
                file.content
            )));
        }
    }
}
