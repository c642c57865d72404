//! Saga log
//!
//! Append-only audit channel. Every append is persisted and mirrored as a
//! `tracing` event; the orchestrator never reads entries back.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::persistence::SagaLogRepository;
use crate::domain::entities::{SagaLogEntry, SagaLogType};
use crate::error::Result;

#[derive(Clone)]
pub struct SagaLog {
    repository: Arc<dyn SagaLogRepository>,
}

impl SagaLog {
    pub fn new(repository: Arc<dyn SagaLogRepository>) -> Self {
        Self { repository }
    }

    pub async fn append(
        &self,
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        log_type: SagaLogType,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        let entry = SagaLogEntry::new(saga_instance_id, saga_step_id, log_type, message);

        match log_type {
            SagaLogType::Info => {
                info!(saga_id = %saga_instance_id, step_id = ?saga_step_id, "{}", entry.message)
            }
            SagaLogType::Warning => {
                warn!(saga_id = %saga_instance_id, step_id = ?saga_step_id, "{}", entry.message)
            }
            SagaLogType::Error => {
                error!(saga_id = %saga_instance_id, step_id = ?saga_step_id, "{}", entry.message)
            }
            SagaLogType::Debug => {
                debug!(saga_id = %saga_instance_id, step_id = ?saga_step_id, "{}", entry.message)
            }
        }

        self.repository.save(&entry).await?;
        Ok(entry)
    }

    pub async fn info(
        &self,
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        self.append(saga_instance_id, saga_step_id, SagaLogType::Info, message)
            .await
    }

    pub async fn warning(
        &self,
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        self.append(saga_instance_id, saga_step_id, SagaLogType::Warning, message)
            .await
    }

    pub async fn error(
        &self,
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        self.append(saga_instance_id, saga_step_id, SagaLogType::Error, message)
            .await
    }

    pub async fn debug(
        &self,
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        message: impl Into<String>,
    ) -> Result<SagaLogEntry> {
        self.append(saga_instance_id, saga_step_id, SagaLogType::Debug, message)
            .await
    }
}
