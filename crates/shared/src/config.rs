//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Tenant blob storage settings.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Partial-submission cookie settings.
    #[serde(default)]
    pub partial_submission: PartialSubmissionSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Blob storage settings for the current tenant.
///
/// These are raw settings; `formvault_core::storage::resolve_storage_config`
/// turns them into the capability descriptor the rest of the system consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Whether blob storage is configured at all.
    #[serde(default)]
    pub enabled: bool,
    /// Whether raw object URLs require a read token.
    #[serde(default)]
    pub private: bool,
    /// Storage account name, used to derive the host name.
    #[serde(default)]
    pub account_name: Option<String>,
    /// Explicit blob host name. Takes precedence over `account_name`.
    #[serde(default)]
    pub host_name: Option<String>,
    /// Container holding end-user uploads.
    #[serde(default = "default_user_files_container")]
    pub user_files_container: String,
    /// Container holding form content (logos, images).
    #[serde(default = "default_content_container")]
    pub content_container: String,
    /// Images strictly below this size go through the resizing proxy.
    #[serde(default = "default_proxy_image_max_bytes")]
    pub proxy_image_max_bytes: u64,
    /// Base URL of the application API (upload, SAS and delete endpoints).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            private: false,
            account_name: None,
            host_name: None,
            user_files_container: default_user_files_container(),
            content_container: default_content_container(),
            proxy_image_max_bytes: default_proxy_image_max_bytes(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_user_files_container() -> String {
    "user-files".to_string()
}

fn default_content_container() -> String {
    "content".to_string()
}

fn default_proxy_image_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Partial-submission continuation cookie settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialSubmissionSettings {
    /// Cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Cookie lifetime in days, kept as text and parsed by the token store.
    #[serde(default = "default_duration_days")]
    pub duration_days: String,
}

impl Default for PartialSubmissionSettings {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            duration_days: default_duration_days(),
        }
    }
}

fn default_cookie_name() -> String {
    "FPSK".to_string()
}

fn default_duration_days() -> String {
    "7".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FORMVAULT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
