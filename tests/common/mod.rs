#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use saga_coordinator::core::patterns::sagas::{
    SagaInstanceRepository, SagaLogRepository, SagaStepRepository,
};
use saga_coordinator::{
    AppError, SagaConfig, SagaDefinition, SagaRepositories, SagaTrigger, StepActionRegistry,
    StepDefinition,
};

pub mod mocks;

pub use mocks::*;

/// Saga settings with retry delays short enough for tests
pub fn fast_config() -> SagaConfig {
    SagaConfig {
        default_max_retries: 0,
        retry_delay_ms: 1,
        retry_backoff_multiplier: 1.0,
        max_retry_delay_ms: 5,
        step_timeout_ms: None,
    }
}

pub fn repositories<S>(store: Arc<S>) -> SagaRepositories
where
    S: SagaInstanceRepository + SagaStepRepository + SagaLogRepository + 'static,
{
    SagaRepositories::from_store(store)
}

pub fn registration_trigger(email: &str) -> SagaTrigger {
    SagaTrigger::new(
        "account-registration",
        json!({ "email": email, "password": "correct horse", "name": "Ada" }),
    )
    .with_tenant("tenant-a")
}

/// Ordered record of forward and compensating invocations
#[derive(Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn forward(&self) -> Vec<String> {
        self.with_prefix("forward:")
    }

    pub fn compensations(&self) -> Vec<String> {
        self.with_prefix("compensate:")
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| event.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

/// Behaviour of a journaled test step
#[derive(Clone, Copy, Default, PartialEq)]
pub struct StepBehaviour {
    pub fail_forward: bool,
    pub fail_compensation: bool,
}

impl StepBehaviour {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_forward: true,
            ..Self::default()
        }
    }

    pub fn failing_compensation() -> Self {
        Self {
            fail_compensation: true,
            ..Self::default()
        }
    }
}

/// Register `kind` with actions that write to `journal`
pub fn register_journaled(
    registry: &mut StepActionRegistry,
    kind: &str,
    journal: &Journal,
    behaviour: StepBehaviour,
) {
    let forward_journal = journal.clone();
    let compensate_journal = journal.clone();
    let forward_kind = kind.to_string();
    let compensate_kind = kind.to_string();

    registry
        .register_fn(
            kind,
            move |ctx, _payload| {
                let journal = forward_journal.clone();
                let kind = forward_kind.clone();
                async move {
                    journal.push(format!("forward:{}", kind));
                    if behaviour.fail_forward {
                        return Err(AppError::CommandFailed {
                            command: kind,
                            message: "forward failed".to_string(),
                        });
                    }
                    Ok::<Value, AppError>(json!({ "step": ctx.step_name, "order": ctx.order }))
                }
            },
            move |_ctx, _payload, _result| {
                let journal = compensate_journal.clone();
                let kind = compensate_kind.clone();
                async move {
                    journal.push(format!("compensate:{}", kind));
                    if behaviour.fail_compensation {
                        return Err(AppError::CommandFailed {
                            command: kind,
                            message: "compensation failed".to_string(),
                        });
                    }
                    Ok::<(), AppError>(())
                }
            },
        )
        .unwrap();
}

/// A saga named `name` with one journaled step per entry of `steps`
pub fn journaled_saga(
    name: &str,
    steps: &[(&str, StepBehaviour)],
    journal: &Journal,
) -> (SagaDefinition, StepActionRegistry) {
    let mut registry = StepActionRegistry::new();
    let mut definition = SagaDefinition::new(name);
    for (kind, behaviour) in steps {
        register_journaled(&mut registry, kind, journal, *behaviour);
        definition = definition.step(StepDefinition::new(*kind, *kind));
    }
    (definition, registry)
}
