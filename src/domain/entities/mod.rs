//! Saga domain entities
//!
//! Current-state records for saga instances and steps, plus the append-only
//! log entries written alongside them.

pub mod saga_instance;
pub mod saga_log;
pub mod saga_status;
pub mod saga_step;
pub mod timestamp;

pub use saga_instance::SagaInstance;
pub use saga_log::{SagaLogEntry, SagaLogType};
pub use saga_status::{InvalidTransition, SagaStatus, SagaStepStatus};
pub use saga_step::SagaStep;
