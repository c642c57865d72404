//! Read side of saga state for operators
//!
//! The orchestrator never reads through this service. It only projects what
//! the repositories hold, plus the single correction allowed on log entries.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::core::patterns::sagas::SagaRepositories;
use crate::domain::entities::{SagaInstance, SagaLogEntry, SagaLogType, SagaStatus, SagaStep};
use crate::error::{AppError, Result};

/// Instance counts per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SagaStatistics {
    pub total_instances: u64,
    pub pending_instances: u64,
    pub running_instances: u64,
    pub completed_instances: u64,
    pub failed_instances: u64,
    /// Completed share of finished instances, 0.0 when none finished
    pub success_rate: f64,
}

/// An instance with its steps and log trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaDetails {
    pub instance: SagaInstance,
    pub steps: Vec<SagaStep>,
    pub logs: Vec<SagaLogEntry>,
}

#[derive(Clone)]
pub struct SagaQueryService {
    repositories: SagaRepositories,
}

impl SagaQueryService {
    pub fn new(repositories: SagaRepositories) -> Self {
        Self { repositories }
    }

    pub async fn get_instance(&self, id: Uuid) -> Result<SagaInstance> {
        self.repositories
            .instances
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saga instance {} not found", id)))
    }

    pub async fn get_step(&self, id: Uuid) -> Result<SagaStep> {
        self.repositories
            .steps
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saga step {} not found", id)))
    }

    pub async fn get_log_entry(&self, id: Uuid) -> Result<SagaLogEntry> {
        self.repositories
            .logs
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saga log entry {} not found", id)))
    }

    pub async fn steps_for_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaStep>> {
        self.repositories
            .steps
            .find_by_instance(saga_instance_id)
            .await
    }

    pub async fn logs_for_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        self.repositories.logs.find_by_instance(saga_instance_id).await
    }

    pub async fn logs_for_step(&self, saga_step_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        self.repositories.logs.find_by_step(saga_step_id).await
    }

    pub async fn instances_by_status(&self, status: SagaStatus) -> Result<Vec<SagaInstance>> {
        self.repositories.instances.find_by_status(status).await
    }

    pub async fn instances_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> Result<Vec<SagaInstance>> {
        self.repositories
            .instances
            .find_by_correlation_id(correlation_id)
            .await
    }

    pub async fn details(&self, saga_instance_id: Uuid) -> Result<SagaDetails> {
        let instance = self.get_instance(saga_instance_id).await?;
        let steps = self.steps_for_instance(saga_instance_id).await?;
        let logs = self.logs_for_instance(saga_instance_id).await?;

        Ok(SagaDetails {
            instance,
            steps,
            logs,
        })
    }

    pub async fn statistics(&self) -> Result<SagaStatistics> {
        let mut stats = SagaStatistics::default();

        for status in SagaStatus::ALL {
            let count = self.repositories.instances.count_by_status(status).await?;
            match status {
                SagaStatus::Pending => stats.pending_instances = count,
                SagaStatus::Running => stats.running_instances = count,
                SagaStatus::Completed => stats.completed_instances = count,
                SagaStatus::Failed => stats.failed_instances = count,
            }
            stats.total_instances += count;
        }

        let finished = stats.completed_instances + stats.failed_instances;
        if finished > 0 {
            stats.success_rate = stats.completed_instances as f64 / finished as f64;
        }

        Ok(stats)
    }

    /// Change the type and message of a log entry. Ids, owner references and
    /// the creation time stay as recorded.
    pub async fn amend_log_entry(
        &self,
        id: Uuid,
        log_type: SagaLogType,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Log message cannot be empty".to_string(),
            ));
        }

        let mut entry = self.get_log_entry(id).await?;
        entry.correct(log_type, message);
        self.repositories.logs.save(&entry).await?;

        info!(log_id = %id, log_type = %log_type, "✏️ Saga log entry amended");
        Ok(entry)
    }
}
