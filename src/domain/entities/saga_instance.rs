use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::saga_status::SagaStatus;

/// One run of a saga definition.
///
/// `start_date` is set exactly once, when the instance first becomes RUNNING.
/// `end_date` is set if and only if the status is terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SagaInstance {
    pub id: Uuid,
    pub name: String,
    pub status: SagaStatus,
    pub correlation_id: Uuid,
    pub tenant_id: Option<String>,
    pub step_ids: Vec<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaInstance {
    const ENTITY: &'static str = "saga instance";

    pub fn new(name: impl Into<String>, correlation_id: Uuid, tenant_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: SagaStatus::Pending,
            correlation_id,
            tenant_id,
            step_ids: Vec::new(),
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) {
        self.status.advance(SagaStatus::Running, Self::ENTITY, self.id);
        let now = Utc::now();
        self.start_date.get_or_insert(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self) {
        self.finish(SagaStatus::Completed);
    }

    pub fn fail(&mut self) {
        self.finish(SagaStatus::Failed);
    }

    fn finish(&mut self, terminal: SagaStatus) {
        self.status.advance(terminal, Self::ENTITY, self.id);
        let now = Utc::now();
        self.end_date = Some(now);
        self.updated_at = now;
    }

    /// Record that a step now belongs to this instance. Only a RUNNING
    /// instance accepts new steps.
    pub fn attach_step(&mut self, step_id: Uuid) {
        assert!(
            self.status == SagaStatus::Running,
            "cannot attach step {} to {} saga instance {}",
            step_id,
            self.status,
            self.id
        );
        self.step_ids.push(step_id);
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start).num_milliseconds()),
            _ => None,
        }
    }
}
