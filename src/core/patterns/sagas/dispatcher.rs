use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::orchestrator::SagaOrchestrator;
use crate::core::patterns::events::{DomainEvent, SagaTrigger, TriggerHandler};
use crate::error::{AppError, Result};

/// Routes triggers to the orchestrator subscribed under their saga name
#[derive(Default, Clone)]
pub struct SagaDispatcher {
    orchestrators: HashMap<String, Arc<SagaOrchestrator>>,
}

impl SagaDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, orchestrator: SagaOrchestrator) -> Result<()> {
        let name = orchestrator.saga_name().to_string();
        if self.orchestrators.contains_key(&name) {
            return Err(AppError::ConfigError(format!(
                "Saga '{}' already has an orchestrator",
                name
            )));
        }

        info!(saga_name = %name, "📡 Subscribed saga orchestrator");
        self.orchestrators.insert(name, Arc::new(orchestrator));
        Ok(())
    }

    pub fn orchestrator(&self, saga_name: &str) -> Option<Arc<SagaOrchestrator>> {
        self.orchestrators.get(saga_name).cloned()
    }

    pub fn saga_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.orchestrators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn dispatch(&self, trigger: SagaTrigger) -> Result<Uuid> {
        let orchestrator = self.orchestrators.get(&trigger.saga_name).ok_or_else(|| {
            AppError::ConfigError(format!(
                "No orchestrator subscribed for saga '{}'",
                trigger.saga_name
            ))
        })?;

        debug!(
            event_id = %trigger.event_id,
            event_type = trigger.event_type(),
            saga_name = %trigger.saga_name,
            "Dispatching saga trigger"
        );
        orchestrator.handle(trigger).await
    }

    /// Run every trigger concurrently; results keep the input order
    pub async fn dispatch_all(&self, triggers: Vec<SagaTrigger>) -> Vec<Result<Uuid>> {
        join_all(triggers.into_iter().map(|trigger| self.dispatch(trigger))).await
    }
}

#[async_trait]
impl TriggerHandler for SagaDispatcher {
    async fn handle_trigger(&self, trigger: SagaTrigger) -> Result<Uuid> {
        self.dispatch(trigger).await
    }

    fn handler_name(&self) -> &'static str {
        "saga-dispatcher"
    }
}
