//! Partial-submission continuation token store.
//!
//! One cookie holds a JSON object mapping form ids to the anonymous
//! continuation token of an unfinished submission:
//!
//! ```text
//! FPSK={"1234":"9f3c-...","abcd":"77e1-..."}; HttpOnly; SameSite=Strict; Path=/
//! ```
//!
//! The cookie never holds an empty map. Removing the last entry clears it.

use std::collections::BTreeMap;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use formvault_shared::{
    AppError, IdentifierKind, PartialSubmissionSettings, validate_identifier,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

type TokenMap = BTreeMap<String, String>;

/// Token store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStoreError {
    /// A form id or token was empty or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The request carries no continuation cookie.
    #[error("no partial submission cookie")]
    CookieMissing,

    /// The cookie has no entry for the form.
    #[error("no partial submission token for form {0}")]
    EntryMissing(String),

    /// The cookie value is not a JSON object of strings.
    #[error("partial submission cookie is not valid JSON: {0}")]
    Malformed(String),

    /// The configured cookie lifetime could not be parsed.
    #[error("invalid partial submission duration '{0}': expected a positive number of days")]
    InvalidDuration(String),
}

impl TokenStoreError {
    /// Create an invalid input error from a validation failure.
    #[must_use]
    pub fn invalid_input(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::InvalidInput(msg),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<TokenStoreError> for AppError {
    fn from(err: TokenStoreError) -> Self {
        match err {
            TokenStoreError::InvalidInput(msg) => Self::Validation(msg),
            TokenStoreError::CookieMissing | TokenStoreError::EntryMissing(_) => {
                Self::NotFound(err.to_string())
            }
            TokenStoreError::Malformed(_) => Self::Parse(err.to_string()),
            TokenStoreError::InvalidDuration(_) => Self::Configuration(err.to_string()),
        }
    }
}

/// Cookie-backed map from form id to continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSubmissionTokenStore {
    cookie_name: String,
    duration: Duration,
}

impl PartialSubmissionTokenStore {
    /// Create a store.
    ///
    /// `duration_days` must be a positive whole number of days. Anything else
    /// is a deployment error and is reported rather than defaulted.
    pub fn new(
        cookie_name: impl Into<String>,
        duration_days: &str,
    ) -> Result<Self, TokenStoreError> {
        let cookie_name = cookie_name.into();
        if cookie_name.trim().is_empty() {
            return Err(TokenStoreError::InvalidInput(
                "cookie name is required".to_string(),
            ));
        }
        let days = duration_days
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| TokenStoreError::InvalidDuration(duration_days.to_string()))?;

        Ok(Self {
            cookie_name,
            duration: Duration::days(i64::from(days)),
        })
    }

    /// Create a store from configuration.
    pub fn from_settings(settings: &PartialSubmissionSettings) -> Result<Self, TokenStoreError> {
        Self::new(settings.cookie_name.clone(), &settings.duration_days)
    }

    /// Cookie name.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Cookie lifetime.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get the continuation token for a form.
    pub fn get_token(&self, jar: &CookieJar, form_id: &str) -> Result<String, TokenStoreError> {
        validate_identifier(IdentifierKind::FormId, form_id)
            .map_err(TokenStoreError::invalid_input)?;

        let mut map = self.read(jar)?.ok_or(TokenStoreError::CookieMissing)?;
        map.remove(form_id)
            .ok_or_else(|| TokenStoreError::EntryMissing(form_id.to_string()))
    }

    /// Store a continuation token, keeping the other forms' entries.
    ///
    /// A cookie that cannot be parsed is replaced rather than merged.
    pub fn set_token(
        &self,
        jar: CookieJar,
        form_id: &str,
        token: &str,
    ) -> Result<CookieJar, TokenStoreError> {
        validate_identifier(IdentifierKind::FormId, form_id)
            .map_err(TokenStoreError::invalid_input)?;
        validate_identifier(IdentifierKind::Token, token)
            .map_err(TokenStoreError::invalid_input)?;

        let mut map = match self.read(&jar) {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                warn!(cookie = %self.cookie_name, error = %e, "Replacing unreadable cookie");
                TokenMap::new()
            }
        };
        map.insert(form_id.to_string(), token.to_string());
        debug!(form_id = %form_id, entries = map.len(), "Stored partial submission token");

        self.write(jar, &map)
    }

    /// Remove the token for a form.
    ///
    /// Missing cookies and entries are a no-op. Removing the last entry, or
    /// hitting an unreadable cookie, clears the cookie.
    pub fn delete_token(&self, jar: CookieJar, form_id: &str) -> Result<CookieJar, TokenStoreError> {
        validate_identifier(IdentifierKind::FormId, form_id)
            .map_err(TokenStoreError::invalid_input)?;

        let mut map = match self.read(&jar) {
            Ok(Some(map)) => map,
            Ok(None) => return Ok(jar),
            Err(e) => {
                warn!(cookie = %self.cookie_name, error = %e, "Clearing unreadable cookie");
                return Ok(jar.add(self.removal_cookie()));
            }
        };
        if map.remove(form_id).is_none() {
            return Ok(jar);
        }
        debug!(form_id = %form_id, entries = map.len(), "Removed partial submission token");

        if map.is_empty() {
            Ok(jar.add(self.removal_cookie()))
        } else {
            self.write(jar, &map)
        }
    }

    /// Parse the cookie. `Ok(None)` when there is no cookie.
    fn read(&self, jar: &CookieJar) -> Result<Option<TokenMap>, TokenStoreError> {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Ok(None);
        };
        // A cleared cookie lingers in the jar with an empty value.
        if cookie.value().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(cookie.value())
            .map(Some)
            .map_err(|e| TokenStoreError::Malformed(e.to_string()))
    }

    fn write(&self, jar: CookieJar, map: &TokenMap) -> Result<CookieJar, TokenStoreError> {
        let value =
            serde_json::to_string(map).map_err(|e| TokenStoreError::Malformed(e.to_string()))?;
        let cookie = Cookie::build((self.cookie_name.clone(), value))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(self.duration)
            .expires(OffsetDateTime::now_utc() + self.duration)
            .build();
        Ok(jar.add(cookie))
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}
