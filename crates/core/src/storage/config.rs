//! Drive uploader configuration types.

use hackportal_shared::StorageSettings;

/// Drive uploader configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    /// Multipart upload endpoint.
    pub upload_url: String,
    /// Prefix prepended to file ids to build public links.
    pub file_view_prefix: String,
    /// OAuth scope requested for the service account.
    pub scope: String,
}

impl DriveConfig {
    /// Default Drive v3 upload endpoint.
    pub const DEFAULT_UPLOAD_URL: &'static str = "https://www.googleapis.com/upload/drive/v3/files";
    /// Default file-view link prefix.
    pub const DEFAULT_FILE_VIEW_PREFIX: &'static str = "https://drive.google.com/file/d/";
    /// Full Drive access scope.
    pub const DRIVE_SCOPE: &'static str = "https://www.googleapis.com/auth/drive";

    /// Create a config with the public Drive endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            upload_url: Self::DEFAULT_UPLOAD_URL.to_string(),
            file_view_prefix: Self::DEFAULT_FILE_VIEW_PREFIX.to_string(),
            scope: Self::DRIVE_SCOPE.to_string(),
        }
    }

    /// Set the upload endpoint.
    #[must_use]
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    /// Set the file-view link prefix.
    #[must_use]
    pub fn with_file_view_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_view_prefix = prefix.into();
        self
    }

    /// Set the OAuth scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&StorageSettings> for DriveConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            upload_url: settings.upload_url.clone(),
            file_view_prefix: settings.file_view_prefix.clone(),
            scope: settings.scope.clone(),
        }
    }
}
