//! Document store error types.

use hackportal_shared::AppError;
use mongodb::error::{ErrorKind, RETRYABLE_WRITE_ERROR};
use thiserror::Error;

use crate::collection::Collection;

/// Document store operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The store did not acknowledge a write.
    #[error("{operation} on collection '{collection}' was not acknowledged")]
    Unacknowledged {
        /// Operation that was attempted.
        operation: &'static str,
        /// Target collection.
        collection: Collection,
    },

    /// Driver or server failure.
    #[error("document store error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// Query or update uses syntax the backend cannot evaluate.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// A document with the same `_id` already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// Update patch contains no fields.
    #[error("update patch is empty")]
    EmptyPatch,

    /// Collection name is not one of the known collections.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

impl DocumentError {
    /// Create an unacknowledged write error.
    #[must_use]
    pub const fn unacknowledged(operation: &'static str, collection: Collection) -> Self {
        Self::Unacknowledged {
            operation,
            collection,
        }
    }

    /// Create an unsupported query error.
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedQuery(msg.into())
    }

    /// Whether an upstream caller could reasonably retry the operation.
    ///
    /// Nothing in this crate retries; this only classifies the failure.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unacknowledged { .. } => true,
            Self::Driver(err) => {
                err.contains_label(RETRYABLE_WRITE_ERROR)
                    || matches!(
                        *err.kind,
                        ErrorKind::Io(_)
                            | ErrorKind::ServerSelection { .. }
                            | ErrorKind::ConnectionPoolCleared { .. }
                    )
            }
            Self::UnsupportedQuery(_)
            | Self::DuplicateKey(_)
            | Self::EmptyPatch
            | Self::UnknownCollection(_) => false,
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::EmptyPatch
            | DocumentError::UnsupportedQuery(_)
            | DocumentError::DuplicateKey(_)
            | DocumentError::UnknownCollection(_) => Self::Validation(err.to_string()),
            DocumentError::Unacknowledged { .. } | DocumentError::Driver(_) => {
                Self::Database(err.to_string())
            }
        }
    }
}
