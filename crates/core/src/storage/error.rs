//! Storage error types.

use std::path::PathBuf;

use hackportal_shared::AppError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No service-account key was configured or the file does not exist.
    #[error("service account credentials not found{}", path_suffix(.path.as_ref()))]
    MissingCredentials {
        /// Configured key path, if any.
        path: Option<PathBuf>,
    },

    /// Service-account key could not be read or parsed.
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// Signing the token assertion failed.
    #[error("failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint rejected the assertion.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The upload endpoint returned a non-success status.
    #[error("upload failed with status {status}: {body}")]
    Upload {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Upload arguments are unusable.
    #[error("invalid upload request: {0}")]
    InvalidRequest(String),
}

fn path_suffix(path: Option<&PathBuf>) -> String {
    path.map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

impl StorageError {
    /// Create a missing credentials error.
    #[must_use]
    pub fn missing_credentials(path: Option<PathBuf>) -> Self {
        Self::MissingCredentials { path }
    }

    /// Create an invalid credentials error.
    #[must_use]
    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::MissingCredentials { .. }
            | StorageError::InvalidCredentials(_)
            | StorageError::Signing(_) => Self::Configuration(err.to_string()),
            StorageError::InvalidRequest(_) => Self::Validation(err.to_string()),
            StorageError::TokenExchange(_)
            | StorageError::Upload { .. }
            | StorageError::Http(_)
            | StorageError::InvalidResponse(_) => Self::ExternalService(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_display() {
        assert_eq!(
            StorageError::missing_credentials(None).to_string(),
            "service account credentials not found"
        );
        assert_eq!(
            StorageError::missing_credentials(Some(PathBuf::from("/secrets/key.json"))).to_string(),
            "service account credentials not found at /secrets/key.json"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = StorageError::missing_credentials(None).into();
        assert_eq!(app.error_code(), "CONFIGURATION_ERROR");

        let app: AppError = StorageError::Upload {
            status: 403,
            body: "forbidden".into(),
        }
        .into();
        assert_eq!(app.error_code(), "EXTERNAL_SERVICE_ERROR");

        let app: AppError = StorageError::invalid_request("empty folder id").into();
        assert_eq!(app.status_code(), 400);
    }
}
