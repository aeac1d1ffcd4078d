//! Drive upload service.

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use hackportal_shared::StorageSettings;

use super::config::DriveConfig;
use super::credentials::ServiceAccountKey;
use super::error::StorageError;
use super::token::{ServiceAccountTokenProvider, TokenProvider};

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

/// Uploads files into Drive folders and returns public links.
#[derive(Debug)]
pub struct DriveUploader<T: TokenProvider = ServiceAccountTokenProvider> {
    http: reqwest::Client,
    tokens: T,
    config: DriveConfig,
}

impl DriveUploader<ServiceAccountTokenProvider> {
    /// Build an uploader from application settings.
    ///
    /// Loads the service-account key named by `service_account_file`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if no key file is configured or it does
    /// not exist, and `InvalidCredentials` if it cannot be used.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let path = settings
            .service_account_file
            .as_ref()
            .ok_or_else(|| StorageError::missing_credentials(None))?;
        let key = ServiceAccountKey::from_file(path)?;

        let config = DriveConfig::from(settings);
        let http = reqwest::Client::new();
        let tokens = ServiceAccountTokenProvider::with_http_client(http.clone(), key, &config.scope)?;

        info!(
            client_email = %tokens.client_email(),
            "Drive uploader configured"
        );
        Ok(Self::with_http_client(http, tokens, config))
    }
}

impl<T: TokenProvider> DriveUploader<T> {
    /// Create an uploader with its own HTTP client.
    #[must_use]
    pub fn new(tokens: T, config: DriveConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), tokens, config)
    }

    /// Create an uploader sharing an existing HTTP client.
    #[must_use]
    pub const fn with_http_client(http: reqwest::Client, tokens: T, config: DriveConfig) -> Self {
        Self {
            http,
            tokens,
            config,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Public link for an uploaded file.
    #[must_use]
    pub fn file_url(&self, file_id: &str) -> String {
        format!("{}{file_id}", self.config.file_view_prefix)
    }

    /// Upload `file_bytes` as `file_name` into the folder `folder_id`.
    ///
    /// Returns the public link to the new file.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are empty, authentication fails,
    /// or Drive rejects the upload.
    pub async fn upload(
        &self,
        folder_id: &str,
        file_name: &str,
        file_bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        if folder_id.is_empty() {
            return Err(StorageError::invalid_request("folder id is empty"));
        }
        if file_name.is_empty() {
            return Err(StorageError::invalid_request("file name is empty"));
        }

        let token = self.tokens.access_token().await?;

        let boundary = format!("hackportal-{}", Uuid::new_v4().simple());
        let metadata = json!({ "name": file_name, "parents": [folder_id] });
        let body = multipart_related_body(&boundary, &metadata, content_type, file_bytes);

        debug!(
            folder_id,
            file_name,
            content_type,
            size = file_bytes.len(),
            "Uploading file"
        );

        let response = self
            .http
            .post(&self.config.upload_url)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id"),
                ("supportsAllDrives", "true"),
            ])
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, folder_id, file_name, "Drive upload failed");
            return Err(StorageError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadedFile = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("upload response: {e}")))?;

        info!(file_id = %uploaded.id, file_name, "Uploaded file");
        Ok(self.file_url(&uploaded.id))
    }
}

/// Encode a Drive `multipart/related` body: JSON metadata, then the media.
fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    content_type: &str,
    file_bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(file_bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
