//! Application layer: built-in sagas and the read-side services

pub mod sagas;
pub mod services;

pub use services::{SagaDetails, SagaQueryService, SagaStatistics};
