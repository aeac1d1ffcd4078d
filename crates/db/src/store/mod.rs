//! Store backends for the document access layer.
//!
//! A [`DocumentStore`] performs the raw reads and writes and reports whether
//! each write was acknowledged. Acknowledgment policy lives in
//! [`crate::DocumentRepository`], not in the backends.
//!
//! - [`MongoStore`] - MongoDB through the official driver
//! - [`MemoryStore`] - in-process store for development and tests

mod matcher;
mod memory;
mod mongo;

use std::future::Future;

use mongodb::bson::{Bson, Document};

use crate::collection::Collection;
use crate::error::DocumentError;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Result of a single-document insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,
    /// Identifier of the new document.
    pub inserted_id: Bson,
}

/// Result of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether the store confirmed the write.
    pub acknowledged: bool,
    /// Documents matching the filter.
    pub matched_count: u64,
    /// Documents whose contents actually changed.
    pub modified_count: u64,
}

/// How many matching documents an update applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// First matching document only.
    One,
    /// Every matching document.
    Many,
}

impl UpdateScope {
    /// Repository operation name for this scope.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::One => "update_one",
            Self::Many => "update",
        }
    }
}

/// Backend performing raw document operations.
pub trait DocumentStore: Send + Sync {
    /// Insert one document.
    fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> impl Future<Output = Result<InsertOutcome, DocumentError>> + Send;

    /// Find the first document matching `filter`.
    fn find_one(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> impl Future<Output = Result<Option<Document>, DocumentError>> + Send;

    /// Find every document matching `filter`.
    fn find(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> impl Future<Output = Result<Vec<Document>, DocumentError>> + Send;

    /// Apply an update document (e.g. `{"$set": {...}}`) to matching documents.
    fn update(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        scope: UpdateScope,
    ) -> impl Future<Output = Result<UpdateOutcome, DocumentError>> + Send;
}
