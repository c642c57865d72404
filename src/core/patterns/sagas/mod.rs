//! Saga pattern
//!
//! Linear sagas with reverse-order compensation. A definition lists the
//! steps, the registry maps step kinds to their actions, and the
//! orchestrator drives one instance per trigger.

pub mod audit;
pub mod context;
pub mod definition;
pub mod dispatcher;
pub mod orchestrator;
pub mod persistence;
pub mod registry;

pub use audit::SagaLog;
pub use context::StepContext;
pub use definition::{default_payload, PayloadBuilder, PayloadInput, SagaDefinition, StepDefinition};
pub use dispatcher::SagaDispatcher;
pub use orchestrator::SagaOrchestrator;
pub use persistence::{
    SagaInstanceRepository, SagaLogRepository, SagaRepositories, SagaStepRepository,
};
pub use registry::{
    compensate_fn, forward_fn, CompensatingAction, ForwardAction, NoCompensation,
    StepActionRegistry, StepActions,
};
