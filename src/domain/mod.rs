//! Saga domain model and its storage

pub mod entities;
pub mod repositories;

pub use entities::{SagaInstance, SagaLogEntry, SagaLogType, SagaStatus, SagaStep};
pub use repositories::{InMemorySagaStore, MongoSagaStore};
