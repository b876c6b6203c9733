//! HTTP transports for FormVault.
//!
//! Implements the `formvault-core` transport seams over `reqwest`:
//!
//! - [`HttpFileTransport`] - upload proxy, SAS, delete and blob PUT
//! - [`HttpTokenIssuer`] - container read tokens from the token service

mod endpoint;
mod issuer;
mod response;
mod transport;

pub use endpoint::ApiEndpoints;
pub use issuer::HttpTokenIssuer;
pub use transport::{
    FORM_ID_HEADER, FORM_LOCALE_HEADER, HttpFileTransport, SUBMISSION_ID_HEADER,
};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("formvault-client/", env!("CARGO_PKG_VERSION"));
