//! Document repository: insert, retrieve, and update over named collections.

use mongodb::bson::{Bson, Document, doc};
use tracing::{debug, error};

use crate::collection::Collection;
use crate::error::DocumentError;
use crate::store::{DocumentStore, MongoStore, UpdateOutcome, UpdateScope};

/// Repository for generic document operations.
///
/// Every write must be acknowledged by the store; an unacknowledged write is
/// logged and returned as [`DocumentError::Unacknowledged`].
#[derive(Debug, Clone)]
pub struct DocumentRepository<S: DocumentStore = MongoStore> {
    store: S,
}

impl<S: DocumentStore> DocumentRepository<S> {
    /// Creates a new document repository.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Inserts a document and returns its assigned `_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails or is not acknowledged.
    pub async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<Bson, DocumentError> {
        let outcome = self.store.insert_one(collection, document).await?;
        if !outcome.acknowledged {
            error!(%collection, "Document insertion was not acknowledged");
            return Err(DocumentError::unacknowledged("insert", collection));
        }

        debug!(%collection, id = %outcome.inserted_id, "Inserted document");
        Ok(outcome.inserted_id)
    }

    /// Retrieves the first document matching `query`.
    ///
    /// With `fields`, only those fields and `_id` are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn retrieve_one(
        &self,
        collection: Collection,
        query: Document,
        fields: Option<&[&str]>,
    ) -> Result<Option<Document>, DocumentError> {
        self.store
            .find_one(collection, query, projection(fields))
            .await
    }

    /// Retrieves every document matching `query`.
    ///
    /// With `fields`, only those fields and `_id` are returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn retrieve(
        &self,
        collection: Collection,
        query: Document,
        fields: Option<&[&str]>,
    ) -> Result<Vec<Document>, DocumentError> {
        self.store.find(collection, query, projection(fields)).await
    }

    /// Merges `patch` into the first document matching `query`.
    ///
    /// Returns whether the document actually changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is empty, the update fails, or it is
    /// not acknowledged.
    pub async fn update_one(
        &self,
        collection: Collection,
        query: Document,
        patch: Document,
    ) -> Result<bool, DocumentError> {
        self.apply_patch(collection, query, patch, UpdateScope::One)
            .await
    }

    /// Merges `patch` into every document matching `query`.
    ///
    /// Returns whether any document actually changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch is empty, the update fails, or it is
    /// not acknowledged.
    pub async fn update(
        &self,
        collection: Collection,
        query: Document,
        patch: Document,
    ) -> Result<bool, DocumentError> {
        self.apply_patch(collection, query, patch, UpdateScope::Many)
            .await
    }

    async fn apply_patch(
        &self,
        collection: Collection,
        query: Document,
        patch: Document,
        scope: UpdateScope,
    ) -> Result<bool, DocumentError> {
        if patch.is_empty() {
            return Err(DocumentError::EmptyPatch);
        }

        let UpdateOutcome {
            acknowledged,
            matched_count,
            modified_count,
        } = self
            .store
            .update(collection, query, doc! { "$set": patch }, scope)
            .await?;

        if !acknowledged {
            error!(%collection, ?scope, "Document update was not acknowledged");
            return Err(DocumentError::unacknowledged(scope.operation(), collection));
        }

        debug!(
            %collection,
            ?scope,
            matched_count,
            modified_count,
            "Updated documents"
        );
        Ok(modified_count > 0)
    }
}

/// Builds an inclusion projection. No fields, or an empty list, means the
/// whole document.
fn projection(fields: Option<&[&str]>) -> Option<Document> {
    let fields = fields.filter(|f| !f.is_empty())?;
    Some(fields.iter().map(|f| ((*f).to_string(), Bson::Int32(1))).collect())
}
