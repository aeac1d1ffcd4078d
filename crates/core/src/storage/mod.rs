//! Storage uploader for Google Drive.
//!
//! Uploads raw bytes into a Drive folder as a service account and returns a
//! public file-view link.
//!
//! # Flow
//!
//! ```text
//! ServiceAccountKey ──► ServiceAccountTokenProvider ──► bearer token
//!                                                          │
//! bytes + metadata ──► DriveUploader::upload ──► POST multipart/related
//!                                                          │
//!                          "<file_view_prefix><id>" ◄── {"id": ...}
//! ```

mod config;
mod credentials;
mod error;
mod service;
mod token;

pub use config::DriveConfig;
pub use credentials::ServiceAccountKey;
pub use error::StorageError;
pub use service::DriveUploader;
pub use token::{ServiceAccountTokenProvider, TokenProvider};
