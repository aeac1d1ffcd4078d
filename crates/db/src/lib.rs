//! Document store access layer.
//!
//! This crate provides:
//! - [`Collection`], the closed set of named collections
//! - [`DocumentRepository`], insert/retrieve/update with acknowledgment checks
//! - Store backends: [`MongoStore`] and the in-process [`MemoryStore`]

pub mod collection;
pub mod error;
pub mod repositories;
pub mod store;

pub use collection::Collection;
pub use error::DocumentError;
pub use repositories::DocumentRepository;
pub use store::{DocumentStore, InsertOutcome, MemoryStore, MongoStore, UpdateOutcome, UpdateScope};

pub use mongodb::bson;

use hackportal_shared::DatabaseConfig;

/// Establishes a client for the configured database.
///
/// # Errors
///
/// Returns an error if the connection string or client options are invalid.
pub async fn connect(config: &DatabaseConfig) -> Result<MongoStore, DocumentError> {
    MongoStore::connect(config).await
}
