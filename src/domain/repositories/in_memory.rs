//! In-memory saga store
//!
//! Implements all three saga repositories over `RwLock`-guarded maps. Used by
//! tests and by deployments that do not need durable saga history.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::core::patterns::sagas::persistence::{
    SagaInstanceRepository, SagaLogRepository, SagaStepRepository,
};
use crate::domain::entities::{SagaInstance, SagaLogEntry, SagaStatus, SagaStep};
use crate::error::{AppError, Result};

#[derive(Default)]
pub struct InMemorySagaStore {
    instances: RwLock<HashMap<Uuid, SagaInstance>>,
    steps: RwLock<HashMap<Uuid, SagaStep>>,
    // Insertion order is the log order
    logs: RwLock<Vec<SagaLogEntry>>,
}

impl InMemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn instance_count(&self) -> usize {
        self.instances.read().await.len()
    }

    pub async fn log_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

#[async_trait]
impl SagaInstanceRepository for InMemorySagaStore {
    async fn save(&self, instance: &SagaInstance) -> Result<()> {
        debug!(saga_id = %instance.id, status = %instance.status, "Saving saga instance");
        self.instances
            .write()
            .await
            .insert(instance.id, instance.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaInstance>> {
        Ok(self.instances.read().await.get(&id).cloned())
    }

    async fn find_by_status(&self, status: SagaStatus) -> Result<Vec<SagaInstance>> {
        let mut found: Vec<SagaInstance> = self
            .instances
            .read()
            .await
            .values()
            .filter(|instance| instance.status == status)
            .cloned()
            .collect();
        found.sort_by_key(|instance| instance.created_at);
        Ok(found)
    }

    async fn count_by_status(&self, status: SagaStatus) -> Result<u64> {
        let count = self
            .instances
            .read()
            .await
            .values()
            .filter(|instance| instance.status == status)
            .count();
        Ok(count as u64)
    }

    async fn find_by_correlation_id(&self, correlation_id: Uuid) -> Result<Vec<SagaInstance>> {
        let mut found: Vec<SagaInstance> = self
            .instances
            .read()
            .await
            .values()
            .filter(|instance| instance.correlation_id == correlation_id)
            .cloned()
            .collect();
        found.sort_by_key(|instance| instance.created_at);
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.instances
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Saga instance {} not found", id)))
    }
}

#[async_trait]
impl SagaStepRepository for InMemorySagaStore {
    async fn save(&self, step: &SagaStep) -> Result<()> {
        debug!(step_id = %step.id, status = %step.status, "Saving saga step");
        self.steps.write().await.insert(step.id, step.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaStep>> {
        Ok(self.steps.read().await.get(&id).cloned())
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaStep>> {
        let mut found: Vec<SagaStep> = self
            .steps
            .read()
            .await
            .values()
            .filter(|step| step.saga_instance_id == saga_instance_id)
            .cloned()
            .collect();
        found.sort_by_key(|step| step.order);
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.steps
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Saga step {} not found", id)))
    }
}

#[async_trait]
impl SagaLogRepository for InMemorySagaStore {
    async fn save(&self, entry: &SagaLogEntry) -> Result<()> {
        let mut logs = self.logs.write().await;
        match logs.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => logs.push(entry.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaLogEntry>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|entry| entry.saga_instance_id == saga_instance_id)
            .cloned()
            .collect())
    }

    async fn find_by_step(&self, saga_step_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|entry| entry.saga_step_id == Some(saga_step_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut logs = self.logs.write().await;
        let before = logs.len();
        logs.retain(|entry| entry.id != id);
        if logs.len() == before {
            return Err(AppError::NotFound(format!("Saga log entry {} not found", id)));
        }
        Ok(())
    }
}
