//! Service-account key loading.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use super::error::StorageError;

/// Google service-account JSON key.
///
/// Only the fields needed to mint access tokens are kept.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account email, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Key id, sent as the JWT `kid` header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    /// Loads a key from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the file does not exist and
    /// `InvalidCredentials` if it cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::missing_credentials(Some(path.to_path_buf())),
            _ => StorageError::invalid_credentials(format!("{}: {e}", path.display())),
        })?;
        Self::from_json(&contents)
    }

    /// Parses a key from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the JSON is malformed or a required
    /// field is missing.
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        serde_json::from_str(json).map_err(|e| StorageError::invalid_credentials(e.to_string()))
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[hidden]")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}
