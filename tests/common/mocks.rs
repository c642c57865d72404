use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use saga_coordinator::core::patterns::sagas::{
    SagaInstanceRepository, SagaLogRepository, SagaStepRepository,
};
use saga_coordinator::{
    AppError, CommandDescriptor, CommandExecutor, InMemorySagaStore, Result, SagaInstance,
    SagaLogEntry, SagaStatus, SagaStep,
};

/// How often a mocked command fails before it starts succeeding
#[derive(Debug, Clone)]
struct FailurePlan {
    remaining: Option<u32>,
    message: String,
}

/// Command executor that records every command and answers from canned
/// responses
#[derive(Default)]
pub struct MockCommandExecutor {
    responses: Arc<RwLock<HashMap<String, Value>>>,
    failures: Arc<RwLock<HashMap<String, FailurePlan>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    calls: Arc<RwLock<Vec<CommandDescriptor>>>,
}

impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, command: &str, response: Value) {
        self.responses
            .write()
            .await
            .insert(command.to_string(), response);
    }

    /// Make every call of `command` fail
    pub async fn fail_always(&self, command: &str, message: &str) {
        self.failures.write().await.insert(
            command.to_string(),
            FailurePlan {
                remaining: None,
                message: message.to_string(),
            },
        );
    }

    /// Make the next `times` calls of `command` fail
    pub async fn fail_times(&self, command: &str, times: u32, message: &str) {
        self.failures.write().await.insert(
            command.to_string(),
            FailurePlan {
                remaining: Some(times),
                message: message.to_string(),
            },
        );
    }

    pub async fn set_delay(&self, command: &str, delay: Duration) {
        self.delays.write().await.insert(command.to_string(), delay);
    }

    pub async fn calls(&self) -> Vec<CommandDescriptor> {
        self.calls.read().await.clone()
    }

    pub async fn command_names(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|call| call.name.clone())
            .collect()
    }

    pub async fn call_count(&self, command: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.name == command)
            .count()
    }

    pub async fn calls_for_saga(&self, saga_instance_id: Uuid) -> Vec<CommandDescriptor> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.saga_instance_id == Some(saga_instance_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for MockCommandExecutor {
    async fn execute(&self, command: CommandDescriptor) -> Result<Value> {
        self.calls.write().await.push(command.clone());

        let delay = self.delays.read().await.get(&command.name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.failures.write().await;
            if let Some(plan) = failures.get_mut(&command.name) {
                let fail = match plan.remaining.as_mut() {
                    None => true,
                    Some(0) => false,
                    Some(remaining) => {
                        *remaining -= 1;
                        true
                    }
                };
                if fail {
                    return Err(AppError::CommandFailed {
                        command: command.name.clone(),
                        message: plan.message.clone(),
                    });
                }
            }
        }

        let response = self.responses.read().await.get(&command.name).cloned();
        Ok(response.unwrap_or_else(|| json!({ "command": command.name, "ok": true })))
    }
}

/// Saga store whose saves start failing after a configured number of calls
pub struct FaultInjectingStore {
    pub inner: InMemorySagaStore,
    instance_saves_left: AtomicI64,
    step_saves_left: AtomicI64,
    log_saves_left: AtomicI64,
}

impl Default for FaultInjectingStore {
    fn default() -> Self {
        Self {
            inner: InMemorySagaStore::new(),
            instance_saves_left: AtomicI64::new(-1),
            step_saves_left: AtomicI64::new(-1),
            log_saves_left: AtomicI64::new(-1),
        }
    }
}

impl FaultInjectingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_instance_saves_after(&self, successful_saves: i64) {
        self.instance_saves_left
            .store(successful_saves, Ordering::SeqCst);
    }

    pub fn fail_step_saves_after(&self, successful_saves: i64) {
        self.step_saves_left.store(successful_saves, Ordering::SeqCst);
    }

    pub fn fail_log_saves_after(&self, successful_saves: i64) {
        self.log_saves_left.store(successful_saves, Ordering::SeqCst);
    }

    fn allow(counter: &AtomicI64, what: &str) -> Result<()> {
        let left = counter.load(Ordering::SeqCst);
        if left < 0 {
            return Ok(());
        }
        if left == 0 {
            return Err(AppError::DatabaseError(format!(
                "injected failure saving {}",
                what
            )));
        }
        counter.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SagaInstanceRepository for FaultInjectingStore {
    async fn save(&self, instance: &SagaInstance) -> Result<()> {
        Self::allow(&self.instance_saves_left, "saga instance")?;
        SagaInstanceRepository::save(&self.inner, instance).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaInstance>> {
        SagaInstanceRepository::find_by_id(&self.inner, id).await
    }

    async fn find_by_status(&self, status: SagaStatus) -> Result<Vec<SagaInstance>> {
        self.inner.find_by_status(status).await
    }

    async fn count_by_status(&self, status: SagaStatus) -> Result<u64> {
        self.inner.count_by_status(status).await
    }

    async fn find_by_correlation_id(&self, correlation_id: Uuid) -> Result<Vec<SagaInstance>> {
        self.inner.find_by_correlation_id(correlation_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        SagaInstanceRepository::delete(&self.inner, id).await
    }
}

#[async_trait]
impl SagaStepRepository for FaultInjectingStore {
    async fn save(&self, step: &SagaStep) -> Result<()> {
        Self::allow(&self.step_saves_left, "saga step")?;
        SagaStepRepository::save(&self.inner, step).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaStep>> {
        SagaStepRepository::find_by_id(&self.inner, id).await
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaStep>> {
        SagaStepRepository::find_by_instance(&self.inner, saga_instance_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        SagaStepRepository::delete(&self.inner, id).await
    }
}

#[async_trait]
impl SagaLogRepository for FaultInjectingStore {
    async fn save(&self, entry: &SagaLogEntry) -> Result<()> {
        Self::allow(&self.log_saves_left, "saga log entry")?;
        SagaLogRepository::save(&self.inner, entry).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SagaLogEntry>> {
        SagaLogRepository::find_by_id(&self.inner, id).await
    }

    async fn find_by_instance(&self, saga_instance_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        SagaLogRepository::find_by_instance(&self.inner, saga_instance_id).await
    }

    async fn find_by_step(&self, saga_step_id: Uuid) -> Result<Vec<SagaLogEntry>> {
        self.inner.find_by_step(saga_step_id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        SagaLogRepository::delete(&self.inner, id).await
    }
}
