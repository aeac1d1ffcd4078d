//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Environment variable holding the MongoDB connection string.
pub const MONGODB_URI_VAR: &str = "MONGODB_URI";

/// Environment variable holding the path to the service-account key file.
pub const SERVICE_ACCOUNT_FILE_VAR: &str = "SERVICE_ACCOUNT_FILE";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Document store configuration.
    pub database: DatabaseConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// MongoDB connection string.
    pub uri: String,
    /// Database holding the application collections.
    #[serde(default = "default_database_name")]
    pub name: String,
    /// Application name reported to the server.
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

fn default_database_name() -> String {
    "hackuci".to_string()
}

fn default_app_name() -> String {
    "hackportal".to_string()
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Path to the Google service-account JSON key.
    #[serde(default)]
    pub service_account_file: Option<PathBuf>,
    /// Drive multipart upload endpoint.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// Prefix prepended to uploaded file ids to build public links.
    #[serde(default = "default_file_view_prefix")]
    pub file_view_prefix: String,
    /// OAuth scope requested for the service account.
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            service_account_file: None,
            upload_url: default_upload_url(),
            file_view_prefix: default_file_view_prefix(),
            scope: default_scope(),
        }
    }
}

fn default_upload_url() -> String {
    "https://www.googleapis.com/upload/drive/v3/files".to_string()
}

fn default_file_view_prefix() -> String {
    "https://drive.google.com/file/d/".to_string()
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/drive".to_string()
}

fn sources() -> Result<config::Config, config::ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

    config::Config::builder()
        .add_source(config::File::with_name("config/default").required(false))
        .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
        .add_source(config::Environment::with_prefix("HACKPORTAL").separator("__"))
        .set_override_option("database.uri", std::env::var(MONGODB_URI_VAR).ok())?
        .set_override_option(
            "storage.service_account_file",
            std::env::var(SERVICE_ACCOUNT_FILE_VAR).ok(),
        )?
        .build()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// `MONGODB_URI` and `SERVICE_ACCOUNT_FILE` take precedence over the
    /// prefixed `HACKPORTAL__*` variables and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        sources()?.try_deserialize()
    }
}

impl StorageSettings {
    /// Loads only the `storage` section, for tools that never touch the
    /// document store.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        match sources()?.get::<Self>("storage") {
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }
}
