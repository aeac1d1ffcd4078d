//! In-process document store for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use tokio::sync::RwLock;
use tracing::debug;

use super::matcher;
use super::{DocumentStore, InsertOutcome, UpdateOutcome, UpdateScope};
use crate::collection::Collection;
use crate::error::DocumentError;

/// Document store held in memory.
///
/// Clones share the same data. Writes made in unacknowledged mode are still
/// applied, mirroring a `w: 0` write that reached the server.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    unacknowledged: bool,
}

impl MemoryStore {
    /// Creates an empty store that acknowledges every write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that reports every write as unacknowledged.
    #[must_use]
    pub fn unacknowledged() -> Self {
        Self {
            unacknowledged: true,
            ..Self::default()
        }
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    async fn select(
        &self,
        collection: Collection,
        filter: &Document,
        projection: Option<&Document>,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, DocumentError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut selected = Vec::new();
        for document in documents {
            if limit.is_some_and(|n| selected.len() >= n) {
                break;
            }
            if matcher::matches(document, filter)? {
                let output = match projection {
                    Some(projection) => matcher::project(document, projection)?,
                    None => document.clone(),
                };
                selected.push(output);
            }
        }
        Ok(selected)
    }
}

impl DocumentStore for MemoryStore {
    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOutcome, DocumentError> {
        debug!(%collection, "insert_one (memory)");
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        if documents.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(DocumentError::DuplicateKey(format!(
                "_id {id} in collection '{collection}'"
            )));
        }
        documents.push(document);

        Ok(InsertOutcome {
            acknowledged: !self.unacknowledged,
            inserted_id: id,
        })
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, DocumentError> {
        debug!(%collection, ?filter, "find_one (memory)");
        let mut found = self
            .select(collection, &filter, projection.as_ref(), Some(1))
            .await?;
        Ok(found.pop())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, DocumentError> {
        debug!(%collection, ?filter, "find (memory)");
        self.select(collection, &filter, projection.as_ref(), None)
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        scope: UpdateScope,
    ) -> Result<UpdateOutcome, DocumentError> {
        debug!(%collection, ?scope, ?filter, "update (memory)");
        let mut collections = self.collections.write().await;
        let mut matched_count = 0;
        let mut modified_count = 0;

        if let Some(documents) = collections.get_mut(&collection) {
            // Stage every change first so a failing document leaves the batch unapplied.
            let mut staged = Vec::new();
            for (index, document) in documents.iter().enumerate() {
                if !matcher::matches(document, &filter)? {
                    continue;
                }
                matched_count += 1;
                let mut updated = document.clone();
                if matcher::apply_update(&mut updated, &update)? {
                    modified_count += 1;
                    staged.push((index, updated));
                }
                if scope == UpdateScope::One {
                    break;
                }
            }
            for (index, updated) in staged {
                documents[index] = updated;
            }
        }

        Ok(UpdateOutcome {
            acknowledged: !self.unacknowledged,
            matched_count,
            modified_count,
        })
    }
}
