//! Identifier validation.
//!
//! Form ids, submission ids and continuation tokens end up in cookie lookups
//! and in request URLs. Anything that could steer a request elsewhere (path
//! traversal, encoded separators) is rejected before it gets that far.

use std::fmt;

use crate::error::AppError;

/// Encoded sequences that decode to `.`, `/` or `\`.
const ENCODED_TRAVERSAL: [&str; 3] = ["%2e", "%2f", "%5c"];

/// What kind of identifier is being validated, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// Form identifier.
    FormId,
    /// Submission identifier.
    SubmissionId,
    /// Partial-submission continuation token.
    Token,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FormId => "form id",
            Self::SubmissionId => "submission id",
            Self::Token => "token",
        })
    }
}

/// Validate an identifier before it is used in any lookup or URL.
///
/// Accepts non-empty strings made of ASCII hex digits and `-` (UUIDs, hex
/// tokens and numeric ids all qualify).
///
/// # Errors
///
/// Returns `AppError::Validation` if the value is empty, contains a traversal
/// sequence (plain or percent-encoded) or any other character.
pub fn validate_identifier(kind: IdentifierKind, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{kind} is required")));
    }

    let lowered = value.to_ascii_lowercase();
    if lowered.contains("..")
        || lowered.contains('/')
        || lowered.contains('\\')
        || ENCODED_TRAVERSAL.iter().any(|seq| lowered.contains(seq))
    {
        return Err(AppError::Validation(format!(
            "{kind} contains a path traversal sequence"
        )));
    }

    if !value.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        return Err(AppError::Validation(format!(
            "{kind} contains invalid characters"
        )));
    }

    Ok(())
}
