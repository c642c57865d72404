//! Architectural patterns
//!
//! Command and event contracts plus the saga orchestration built on them.

pub mod commands;
pub mod events;
pub mod sagas;

// Re-export commonly used types
pub use commands::{CommandDescriptor, CommandExecutor};
pub use events::{DomainEvent, SagaTrigger, TriggerHandler};
pub use sagas::{SagaDispatcher, SagaOrchestrator};
