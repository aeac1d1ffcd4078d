//! MongoDB backend.

use futures::TryStreamExt;
use mongodb::bson::Document;
use mongodb::options::{Acknowledgment, ClientOptions, FindOneOptions, FindOptions, WriteConcern};
use mongodb::{Client, Database};
use mongodb::error::ErrorKind;
use tracing::{debug, error, info};

use hackportal_shared::DatabaseConfig;

use super::{DocumentStore, InsertOutcome, UpdateOutcome, UpdateScope};
use crate::collection::Collection;
use crate::error::DocumentError;

/// Document store backed by a MongoDB database.
///
/// Cloning is cheap; clones share the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    acknowledged: bool,
}

impl MongoStore {
    /// Connects using the configured connection string and database name.
    ///
    /// The driver connects lazily, so this only fails on an invalid
    /// connection string or client options.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DocumentError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some(config.app_name.clone());

        let client = Client::with_options(options)?;
        let store = Self::from_database(client.database(&config.name));

        info!(
            database = %config.name,
            acknowledged_writes = store.acknowledged,
            "Document store client created"
        );
        Ok(store)
    }

    /// Wraps an existing database handle.
    #[must_use]
    pub fn from_database(database: Database) -> Self {
        let acknowledged = database
            .write_concern()
            .is_none_or(write_concern_acknowledged);
        Self {
            database,
            acknowledged,
        }
    }

    /// The underlying database handle.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Whether writes through this store are acknowledged by the server.
    #[must_use]
    pub const fn acknowledges_writes(&self) -> bool {
        self.acknowledged
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.database.collection(collection.name())
    }

    /// The driver refuses to send writes under a write concern that asks for
    /// no acknowledgment; report those as unacknowledged writes.
    fn write_error(
        &self,
        err: mongodb::error::Error,
        operation: &'static str,
        collection: Collection,
    ) -> DocumentError {
        if !self.acknowledged && matches!(*err.kind, ErrorKind::InvalidArgument { .. }) {
            error!(%collection, operation, "Write rejected: write concern requests no acknowledgment");
            return DocumentError::unacknowledged(operation, collection);
        }
        err.into()
    }
}

/// `w: 0` without journaling asks the server for no acknowledgment.
fn write_concern_acknowledged(concern: &WriteConcern) -> bool {
    !matches!(concern.w, Some(Acknowledgment::Nodes(0))) || concern.journal == Some(true)
}

impl DocumentStore for MongoStore {
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, DocumentError> {
        debug!(%collection, "insert_one");
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| self.write_error(e, "insert", collection))?;

        Ok(InsertOutcome {
            acknowledged: self.acknowledged,
            inserted_id: result.inserted_id,
        })
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, DocumentError> {
        debug!(%collection, ?filter, "find_one");
        let mut options = FindOneOptions::default();
        options.projection = projection;

        let document = self
            .collection(collection)
            .find_one(filter)
            .with_options(options)
            .await?;
        Ok(document)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, DocumentError> {
        debug!(%collection, ?filter, "find");
        let mut options = FindOptions::default();
        options.projection = projection;

        let cursor = self
            .collection(collection)
            .find(filter)
            .with_options(options)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn update(
        &self,
        collection: Collection,
        filter: Document,
        update: Document,
        scope: UpdateScope,
    ) -> Result<UpdateOutcome, DocumentError> {
        debug!(%collection, ?scope, ?filter, "update");
        let target = self.collection(collection);
        let result = match scope {
            UpdateScope::One => target.update_one(filter, update).await,
            UpdateScope::Many => target.update_many(filter, update).await,
        }
        .map_err(|e| self.write_error(e, scope.operation(), collection))?;

        Ok(UpdateOutcome {
            acknowledged: self.acknowledged,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }
}
