//! Persistence contracts for saga state
//!
//! The orchestrator treats every call here as durable and strongly
//! consistent. It never retries a failed call; the error is surfaced to the
//! caller of `handle`.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{SagaInstance, SagaLogEntry, SagaStatus, SagaStep};
use crate::error::Result;

#[async_trait]
pub trait SagaInstanceRepository: Send + Sync {
    /// Insert or replace the instance snapshot
    async fn save(&self, instance: &SagaInstance) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaInstance>>;

    async fn find_by_status(&self, status: SagaStatus) -> Result<Vec<SagaInstance>>;

    async fn count_by_status(&self, status: SagaStatus) -> Result<u64> {
        Ok(self.find_by_status(status).await?.len() as u64)
    }

    async fn find_by_correlation_id(&self, correlation_id: Uuid) -> Result<Vec<SagaInstance>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait SagaStepRepository: Send + Sync {
    /// Insert or replace the step snapshot
    async fn save(&self, step: &SagaStep) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaStep>>;

    /// Steps of one instance, ascending by `order`
    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaStep>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait SagaLogRepository: Send + Sync {
    async fn save(&self, entry: &SagaLogEntry) -> Result<()>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaLogEntry>>;

    /// Entries of one instance, oldest first
    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaLogEntry>>;

    /// Entries of one step, oldest first
    async fn find_by_step(&self, saga_step_id: Uuid) -> Result<Vec<SagaLogEntry>>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Handles to the three saga repositories, usually backed by one store
#[derive(Clone)]
pub struct SagaRepositories {
    pub instances: Arc<dyn SagaInstanceRepository>,
    pub steps: Arc<dyn SagaStepRepository>,
    pub logs: Arc<dyn SagaLogRepository>,
}

impl SagaRepositories {
    pub fn new(
        instances: Arc<dyn SagaInstanceRepository>,
        steps: Arc<dyn SagaStepRepository>,
        logs: Arc<dyn SagaLogRepository>,
    ) -> Self {
        Self {
            instances,
            steps,
            logs,
        }
    }

    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: SagaInstanceRepository + SagaStepRepository + SagaLogRepository + 'static,
    {
        Self {
            instances: store.clone(),
            steps: store.clone(),
            logs: store,
        }
    }
}
