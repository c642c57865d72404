use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::patterns::commands::{CommandDescriptor, CommandExecutor};
use crate::error::Result;

/// Context handed to every forward and compensating action invocation
#[derive(Clone)]
pub struct StepContext {
    pub saga_instance_id: Uuid,
    pub saga_name: String,
    pub step_id: Uuid,
    pub step_name: String,
    pub order: u32,
    /// Number of failed attempts before this one
    pub attempt: u32,
    pub correlation_id: Uuid,
    pub tenant_id: Option<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl StepContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        saga_instance_id: Uuid,
        saga_name: impl Into<String>,
        step_id: Uuid,
        step_name: impl Into<String>,
        order: u32,
        attempt: u32,
        correlation_id: Uuid,
        tenant_id: Option<String>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            saga_instance_id,
            saga_name: saga_name.into(),
            step_id,
            step_name: step_name.into(),
            order,
            attempt,
            correlation_id,
            tenant_id,
            executor,
        }
    }

    /// Build a command carrying this step's correlation, tenant and saga ids
    pub fn command(&self, name: impl Into<String>, payload: serde_json::Value) -> CommandDescriptor {
        CommandDescriptor::new(name, payload, self.correlation_id)
            .with_tenant(self.tenant_id.clone())
            .with_saga_instance(self.saga_instance_id)
    }

    /// Issue a sub-command through the injected executor
    pub async fn execute_command(
        &self,
        name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let command = self.command(name, payload);
        self.executor.execute(command).await
    }

    pub fn executor(&self) -> &Arc<dyn CommandExecutor> {
        &self.executor
    }
}

impl fmt::Debug for StepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("saga_instance_id", &self.saga_instance_id)
            .field("saga_name", &self.saga_name)
            .field("step_id", &self.step_id)
            .field("step_name", &self.step_name)
            .field("order", &self.order)
            .field("attempt", &self.attempt)
            .field("correlation_id", &self.correlation_id)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}
