//! Saga Coordinator - orchestration of multi-step business transactions
//!
//! Runs linear sagas: each step's forward action in ascending order and, on a
//! step failure, the compensating actions of every completed step in reverse.
//! Instance and step state is persisted after every transition alongside an
//! append-only saga log.

pub mod application;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-export commonly used types
pub use crate::application::{SagaQueryService, SagaStatistics};
pub use crate::config::{AppConfiguration, SagaConfig};
pub use crate::core::patterns::commands::{CommandDescriptor, CommandExecutor};
pub use crate::core::patterns::events::{SagaTrigger, TriggerHandler};
pub use crate::core::patterns::sagas::{
    SagaDefinition, SagaDispatcher, SagaOrchestrator, SagaRepositories, StepActionRegistry,
    StepContext, StepDefinition,
};
pub use crate::domain::entities::{SagaInstance, SagaLogEntry, SagaLogType, SagaStatus, SagaStep};
pub use crate::domain::repositories::{InMemorySagaStore, MongoSagaStore};
pub use crate::error::{AppError, Result};
