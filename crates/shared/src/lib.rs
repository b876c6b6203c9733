//! Shared errors, configuration and input validation for FormVault.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - Identifier validation applied before any lookup or URL construction

pub mod config;
pub mod error;
pub mod validation;


pub use config::{AppConfig, PartialSubmissionSettings, ServerConfig, StorageSettings};
pub use error::{AppError, AppResult};
pub use validation::{IdentifierKind, validate_identifier};
