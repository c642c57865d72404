use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::saga_status::SagaStepStatus;

/// Per-step record of a saga instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SagaStep {
    pub id: Uuid,
    pub saga_instance_id: Uuid,
    pub name: String,
    pub kind: String,
    /// 1-based position within the instance. Forward execution is ascending,
    /// compensation is descending.
    pub order: u32,
    pub status: SagaStepStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub payload: serde_json::Value,
    pub result: Option<serde_json::Value>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaStep {
    const ENTITY: &'static str = "saga step";

    pub fn new(
        saga_instance_id: Uuid,
        name: impl Into<String>,
        kind: impl Into<String>,
        order: u32,
        max_retries: u32,
        payload: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            saga_instance_id,
            name: name.into(),
            kind: kind.into(),
            order,
            status: SagaStepStatus::Pending,
            start_date: None,
            end_date: None,
            error_message: None,
            retry_count: 0,
            max_retries,
            payload,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) {
        self.status
            .advance(SagaStepStatus::Running, Self::ENTITY, self.id);
        let now = Utc::now();
        self.start_date.get_or_insert(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self, result: serde_json::Value) {
        self.status
            .advance(SagaStepStatus::Completed, Self::ENTITY, self.id);
        let now = Utc::now();
        self.result = Some(result);
        self.error_message = None;
        self.end_date = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, error_message: impl Into<String>) {
        self.status
            .advance(SagaStepStatus::Failed, Self::ENTITY, self.id);
        let now = Utc::now();
        self.error_message = Some(error_message.into());
        self.end_date = Some(now);
        self.updated_at = now;
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Count another attempt after a failed one. The step stays RUNNING.
    pub fn record_retry(&mut self, error_message: impl Into<String>) {
        assert!(
            self.status == SagaStepStatus::Running && self.can_retry(),
            "saga step {} cannot be retried (status {}, retries {}/{})",
            self.id,
            self.status,
            self.retry_count,
            self.max_retries
        );
        self.retry_count += 1;
        self.error_message = Some(error_message.into());
        self.updated_at = Utc::now();
    }
}
