use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaLogType {
    Info,
    Warning,
    Error,
    Debug,
}

impl fmt::Display for SagaLogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SagaLogType::Info => "INFO",
            SagaLogType::Warning => "WARNING",
            SagaLogType::Error => "ERROR",
            SagaLogType::Debug => "DEBUG",
        };
        f.write_str(label)
    }
}

/// Append-only audit entry. Only `log_type` and `message` may be corrected
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SagaLogEntry {
    pub id: Uuid,
    pub saga_instance_id: Uuid,
    pub saga_step_id: Option<Uuid>,
    pub log_type: SagaLogType,
    pub message: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SagaLogEntry {
    pub fn new(
        saga_instance_id: Uuid,
        saga_step_id: Option<Uuid>,
        log_type: SagaLogType,
        message: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            saga_instance_id,
            saga_step_id,
            log_type,
            message: message.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn correct(&mut self, log_type: SagaLogType, message: impl Into<String>) {
        self.log_type = log_type;
        self.message = message.into();
        self.updated_at = Utc::now();
    }
}
