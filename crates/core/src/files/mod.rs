//! File uploads and deletions.
//!
//! - `policy` - proxy vs direct routing
//! - `upload` - concurrent dual-transport upload with ordered results
//! - `delete` - batched deletion with per-file reporting
//! - `transport` - the endpoint seam implemented by `formvault-client`

mod delete;
mod error;
mod policy;
mod transport;
mod types;
mod upload;


pub use delete::{DeleteOrchestrator, DeleteOutcome, DeleteRequest};
pub use error::TransportError;
pub use policy::{
    ThresholdRoutePolicy, UploadClassification, UploadRoute, UploadRoutePolicy, classify,
};
pub use transport::{
    DeleteFileResult, DeleteFilesRequest, DeleteFilesResponse, DeleteStatus, DeleteTransport,
    ProxyUploadResponse, UploadTransport, UploadedFileRef, WriteUrlEntry, WriteUrlsRequest,
    WriteUrlsResponse,
};
pub use types::{ProtectedFile, SubmissionContext, SubmissionIdListener, UploadFile};
pub use upload::UploadOrchestrator;
