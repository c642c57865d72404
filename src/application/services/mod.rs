pub mod saga_queries;

// Re-export commonly used services
pub use saga_queries::{SagaDetails, SagaQueryService, SagaStatistics};
