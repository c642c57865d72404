//! Status state machine shared by saga instances and saga steps
//!
//! Both follow `PENDING -> RUNNING -> {COMPLETED | FAILED}`. Any other
//! transition is a logic fault in the caller and panics.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Steps share the instance lifecycle.
pub type SagaStepStatus = SagaStatus;

impl SagaStatus {
    pub const ALL: [SagaStatus; 4] = [
        SagaStatus::Pending,
        SagaStatus::Running,
        SagaStatus::Completed,
        SagaStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Pending => "PENDING",
            SagaStatus::Running => "RUNNING",
            SagaStatus::Completed => "COMPLETED",
            SagaStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaStatus::Completed | SagaStatus::Failed)
    }

    pub fn can_transition_to(&self, next: SagaStatus) -> bool {
        matches!(
            (self, next),
            (SagaStatus::Pending, SagaStatus::Running)
                | (SagaStatus::Running, SagaStatus::Completed)
                | (SagaStatus::Running, SagaStatus::Failed)
        )
    }

    /// Check a transition without applying it.
    pub fn check_transition(
        &self,
        next: SagaStatus,
        entity: &'static str,
        id: Uuid,
    ) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                entity,
                id,
                from: *self,
                to: next,
            })
        }
    }

    /// Apply a transition, panicking when the state machine forbids it.
    pub(crate) fn advance(&mut self, next: SagaStatus, entity: &'static str, id: Uuid) {
        if let Err(violation) = self.check_transition(next, entity, id) {
            panic!("{}", violation);
        }
        *self = next;
    }
}

impl fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A forbidden status change. Raised as a panic by the entity methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {entity} status transition for {id}: {from} -> {to}")]
pub struct InvalidTransition {
    pub entity: &'static str,
    pub id: Uuid,
    pub from: SagaStatus,
    pub to: SagaStatus,
}
