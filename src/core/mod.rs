//! Core saga coordination logic
//!
//! Holds the architectural patterns the coordinator is built from and the
//! logging setup shared by binaries and tests.

// Structured logging initialisation
pub mod logging;

// Architectural patterns and design patterns
pub mod patterns;

// Re-export commonly used types for easy access
pub use patterns::{
    CommandDescriptor, CommandExecutor, DomainEvent, SagaDispatcher, SagaOrchestrator,
    SagaTrigger, TriggerHandler,
};
