//! MongoDB implementation of saga persistence
//!
//! Instances, steps and log entries live in separate collections. Every save
//! is an upsert keyed on the entity id, so repeated saves of the same
//! snapshot are idempotent.

use async_trait::async_trait;
use mongodb::{
    bson::{doc, spec::BinarySubtype, to_bson, Binary, Bson, Document},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::core::patterns::sagas::persistence::{
    SagaInstanceRepository, SagaLogRepository, SagaStepRepository,
};
use crate::domain::entities::{SagaInstance, SagaLogEntry, SagaStatus, SagaStep};
use crate::error::{AppError, Result};
use crate::infrastructure::database::DatabaseManager;

/// MongoDB implementation of the three saga repositories
#[derive(Clone)]
pub struct MongoSagaStore {
    instances: Collection<SagaInstance>,
    steps: Collection<SagaStep>,
    logs: Collection<SagaLogEntry>,
}

impl MongoSagaStore {
    /// Open the saga collections and make sure their indexes exist
    pub async fn new(db_manager: &DatabaseManager, config: &DatabaseConfig) -> Result<Self> {
        let store = Self {
            instances: db_manager.collection(&config.instances_collection),
            steps: db_manager.collection(&config.steps_collection),
            logs: db_manager.collection(&config.logs_collection),
        };

        store.create_indexes().await?;
        Ok(store)
    }

    /// Connect with the configured uri and open the saga collections
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_manager = DatabaseManager::from_config(config).await?;
        Self::new(&db_manager, config).await
    }

    async fn create_indexes(&self) -> Result<()> {
        info!("Creating saga persistence indexes...");

        let unique_id = || {
            IndexModel::builder()
                .keys(doc! {"id": 1})
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };

        self.instances
            .create_indexes(
                vec![
                    unique_id(),
                    IndexModel::builder().keys(doc! {"status": 1}).build(),
                    IndexModel::builder()
                        .keys(doc! {"correlation_id": 1})
                        .build(),
                ],
                None,
            )
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create saga instance indexes: {}", e))
            })?;

        self.steps
            .create_indexes(
                vec![
                    unique_id(),
                    IndexModel::builder()
                        .keys(doc! {"saga_instance_id": 1, "order": 1})
                        .build(),
                ],
                None,
            )
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create saga step indexes: {}", e))
            })?;

        self.logs
            .create_indexes(
                vec![
                    unique_id(),
                    IndexModel::builder()
                        .keys(doc! {"saga_instance_id": 1, "created_at": 1})
                        .build(),
                    IndexModel::builder()
                        .keys(doc! {"saga_step_id": 1})
                        .build(),
                ],
                None,
            )
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create saga log indexes: {}", e))
            })?;

        info!("✅ Saga persistence indexes created successfully");
        Ok(())
    }
}

/// The driver writes documents with the raw serializer, which stores a
/// `Uuid` as generic binary rather than as a string
fn uuid_bson(id: Uuid) -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Generic,
        bytes: id.as_bytes().to_vec(),
    })
}

fn uuid_filter(field: &str, id: Uuid) -> Result<Document> {
    Ok(doc! { field: uuid_bson(id) })
}

async fn upsert<T>(collection: &Collection<T>, id: Uuid, value: &T) -> Result<()>
where
    T: Serialize + Send + Sync,
{
    let options = ReplaceOptions::builder().upsert(true).build();
    collection
        .replace_one(uuid_filter("id", id)?, value, options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save {}: {}", id, e)))?;
    Ok(())
}

async fn find_one<T>(collection: &Collection<T>, id: Uuid) -> Result<Option<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    collection
        .find_one(uuid_filter("id", id)?, None)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to load {}: {}", id, e)))
}

async fn find_many<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
) -> Result<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).build();
    let mut cursor = collection
        .find(filter, options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Query failed: {}", e)))?;

    let mut found = Vec::new();
    while cursor
        .advance()
        .await
        .map_err(|e| AppError::DatabaseError(format!("Cursor advance failed: {}", e)))?
    {
        let item = cursor
            .deserialize_current()
            .map_err(|e| AppError::DatabaseError(format!("Deserialization failed: {}", e)))?;
        found.push(item);
    }
    Ok(found)
}

async fn delete_one<T>(collection: &Collection<T>, id: Uuid, what: &str) -> Result<()>
where
    T: Send + Sync,
{
    let result = collection
        .delete_one(uuid_filter("id", id)?, None)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to delete {}: {}", what, e)))?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

#[async_trait]
impl SagaInstanceRepository for MongoSagaStore {
    async fn save(&self, instance: &SagaInstance) -> Result<()> {
        debug!(saga_id = %instance.id, status = %instance.status, "Saving saga instance");
        upsert(&self.instances, instance.id, instance).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaInstance>> {
        find_one(&self.instances, id).await
    }

    async fn find_by_status(&self, status: SagaStatus) -> Result<Vec<SagaInstance>> {
        debug!(status = %status, "Finding saga instances by status");
        find_many(
            &self.instances,
            doc! {"status": to_bson(&status)?},
            doc! {"created_at": 1},
        )
        .await
    }

    async fn count_by_status(&self, status: SagaStatus) -> Result<u64> {
        self.instances
            .count_documents(doc! {"status": to_bson(&status)?}, None)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Count failed: {}", e)))
    }

    async fn find_by_correlation_id(&self, correlation_id: Uuid) -> Result<Vec<SagaInstance>> {
        find_many(
            &self.instances,
            uuid_filter("correlation_id", correlation_id)?,
            doc! {"created_at": 1},
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_one(&self.instances, id, "Saga instance").await
    }
}

#[async_trait]
impl SagaStepRepository for MongoSagaStore {
    async fn save(&self, step: &SagaStep) -> Result<()> {
        debug!(step_id = %step.id, status = %step.status, "Saving saga step");
        upsert(&self.steps, step.id, step).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaStep>> {
        find_one(&self.steps, id).await
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaStep>> {
        find_many(
            &self.steps,
            uuid_filter("saga_instance_id", saga_instance_id)?,
            doc! {"order": 1},
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_one(&self.steps, id, "Saga step").await
    }
}

#[async_trait]
impl SagaLogRepository for MongoSagaStore {
    async fn save(&self, entry: &SagaLogEntry) -> Result<()> {
        upsert(&self.logs, entry.id, entry).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaLogEntry>> {
        find_one(&self.logs, id).await
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        find_many(
            &self.logs,
            uuid_filter("saga_instance_id", saga_instance_id)?,
            doc! {"created_at": 1, "_id": 1},
        )
        .await
    }

    async fn find_by_step(&self, saga_step_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        find_many(
            &self.logs,
            uuid_filter("saga_step_id", saga_step_id)?,
            doc! {"created_at": 1, "_id": 1},
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        delete_one(&self.logs, id, "Saga log entry").await
    }
}
