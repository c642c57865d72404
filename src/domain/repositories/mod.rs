pub mod in_memory;
pub mod saga_persistence;

// Re-export commonly used repositories
pub use in_memory::InMemorySagaStore;
pub use saga_persistence::MongoSagaStore;
