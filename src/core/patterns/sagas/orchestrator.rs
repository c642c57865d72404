//! Saga orchestrator
//!
//! Runs the steps of one saga definition in ascending order. When a step
//! fails for good, every step that reached COMPLETED is compensated in
//! descending order before the instance is marked FAILED. State is saved
//! after every transition, so an interrupted run leaves a readable trail.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::audit::SagaLog;
use super::context::StepContext;
use super::definition::{PayloadInput, SagaDefinition, StepDefinition};
use super::persistence::SagaRepositories;
use super::registry::{StepActionRegistry, StepActions};
use crate::config::SagaConfig;
use crate::core::patterns::commands::CommandExecutor;
use crate::core::patterns::events::{SagaTrigger, TriggerHandler};
use crate::domain::entities::{SagaInstance, SagaStatus, SagaStep};
use crate::error::{AppError, Result};

/// A step definition with its actions already looked up
struct ResolvedStep {
    definition: StepDefinition,
    actions: StepActions,
}

/// A step that reached COMPLETED, kept for compensation
struct CompletedStep {
    step: SagaStep,
    actions: StepActions,
}

enum StepOutcome {
    Completed(CompletedStep),
    Failed { step: SagaStep, reason: String },
}

pub struct SagaOrchestrator {
    name: String,
    steps: Vec<ResolvedStep>,
    repositories: SagaRepositories,
    log: SagaLog,
    executor: Arc<dyn CommandExecutor>,
    config: SagaConfig,
}

impl SagaOrchestrator {
    /// Build an orchestrator for `definition`. Fails if the definition is
    /// malformed or names a step kind the registry does not know.
    pub fn new(
        definition: SagaDefinition,
        registry: &StepActionRegistry,
        repositories: SagaRepositories,
        executor: Arc<dyn CommandExecutor>,
        config: SagaConfig,
    ) -> Result<Self> {
        definition.validate(registry)?;

        let steps = definition
            .steps()
            .iter()
            .map(|step| {
                Ok(ResolvedStep {
                    definition: step.clone(),
                    actions: registry.resolve(&step.kind)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            saga_name = %definition.name(),
            total_steps = steps.len(),
            "🧭 Saga orchestrator ready"
        );

        Ok(Self {
            name: definition.name().to_string(),
            steps,
            log: SagaLog::new(repositories.logs.clone()),
            repositories,
            executor,
            config,
        })
    }

    pub fn saga_name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .map(|step| step.definition.name.as_str())
            .collect()
    }

    /// Run one saga instance for `trigger` and return its id.
    ///
    /// A step failure is returned as `AppError::SagaFailed` once compensation
    /// has been attempted. Persistence errors are returned as they occur and
    /// skip compensation. A trigger addressed to another saga is rejected
    /// before anything is persisted.
    pub async fn handle(&self, trigger: SagaTrigger) -> Result<Uuid> {
        if trigger.saga_name != self.name {
            return Err(AppError::ConfigError(format!(
                "Trigger for saga '{}' sent to the '{}' orchestrator",
                trigger.saga_name, self.name
            )));
        }

        let mut instance = SagaInstance::new(
            self.name.clone(),
            trigger.correlation_id,
            trigger.tenant_id.clone(),
        );
        let saga_id = instance.id;

        self.repositories.instances.save(&instance).await?;
        self.log.info(saga_id, None, "saga created").await?;

        instance.start();
        self.repositories.instances.save(&instance).await?;
        self.log
            .info(
                saga_id,
                None,
                transition_message("saga", &self.name, SagaStatus::Pending, SagaStatus::Running),
            )
            .await?;

        info!(
            saga_id = %saga_id,
            saga_name = %self.name,
            correlation_id = %instance.correlation_id,
            total_steps = self.steps.len(),
            "Starting saga execution"
        );

        let mut results: Vec<(String, Value)> = Vec::with_capacity(self.steps.len());
        let mut completed: Vec<CompletedStep> = Vec::with_capacity(self.steps.len());

        for (index, resolved) in self.steps.iter().enumerate() {
            let order = index as u32 + 1;
            match self
                .run_step(&mut instance, &trigger, &results, resolved, order)
                .await?
            {
                StepOutcome::Completed(done) => {
                    results.push((
                        done.step.name.clone(),
                        done.step.result.clone().unwrap_or(Value::Null),
                    ));
                    completed.push(done);
                }
                StepOutcome::Failed { step, reason } => {
                    let compensation_failures = self.compensate(&instance, completed).await?;

                    instance.fail();
                    self.repositories.instances.save(&instance).await?;
                    self.log
                        .info(
                            saga_id,
                            None,
                            transition_message(
                                "saga",
                                &self.name,
                                SagaStatus::Running,
                                SagaStatus::Failed,
                            ),
                        )
                        .await?;

                    warn!(
                        saga_id = %saga_id,
                        saga_name = %self.name,
                        failed_step = %step.name,
                        compensation_failures = compensation_failures,
                        "Saga failed"
                    );

                    return Err(AppError::SagaFailed {
                        saga_instance_id: saga_id,
                        step: step.name,
                        reason,
                        compensation_failures,
                    });
                }
            }
        }

        instance.complete();
        self.repositories.instances.save(&instance).await?;
        self.log
            .info(
                saga_id,
                None,
                transition_message("saga", &self.name, SagaStatus::Running, SagaStatus::Completed),
            )
            .await?;

        info!(
            saga_id = %saga_id,
            saga_name = %self.name,
            duration_ms = instance.duration_ms().unwrap_or_default(),
            "Saga execution completed successfully"
        );

        Ok(saga_id)
    }

    /// Create, start and drive one step to COMPLETED or FAILED
    async fn run_step(
        &self,
        instance: &mut SagaInstance,
        trigger: &SagaTrigger,
        results: &[(String, Value)],
        resolved: &ResolvedStep,
        order: u32,
    ) -> Result<StepOutcome> {
        let definition = &resolved.definition;
        let (payload, payload_error) =
            match definition.build_payload(&PayloadInput::new(trigger, results)) {
                Ok(payload) => (payload, None),
                Err(e) => (Value::Null, Some(e.to_string())),
            };
        let max_retries = definition
            .max_retries
            .unwrap_or(self.config.default_max_retries);

        let mut step = SagaStep::new(
            instance.id,
            definition.name.clone(),
            definition.kind.clone(),
            order,
            max_retries,
            payload,
        );
        self.repositories.steps.save(&step).await?;
        instance.attach_step(step.id);
        self.repositories.instances.save(instance).await?;
        self.log
            .info(
                instance.id,
                Some(step.id),
                format!("step '{}' created (order {})", step.name, order),
            )
            .await?;

        step.start();
        self.repositories.steps.save(&step).await?;
        self.log
            .info(
                instance.id,
                Some(step.id),
                transition_message("step", &step.name, SagaStatus::Pending, SagaStatus::Running),
            )
            .await?;

        if let Some(e) = payload_error {
            let reason = format!("payload could not be built: {}", e);
            return self.fail_step(instance, step, reason).await;
        }

        loop {
            let ctx = self.step_context(instance, &step);
            debug!(
                saga_id = %instance.id,
                step_name = %step.name,
                order = order,
                attempt = step.retry_count + 1,
                "Executing saga step"
            );

            match self
                .invoke_forward(&resolved.actions, &ctx, step.payload.clone())
                .await
            {
                Ok(result) => {
                    step.complete(result);
                    self.repositories.steps.save(&step).await?;
                    self.log
                        .info(
                            instance.id,
                            Some(step.id),
                            transition_message(
                                "step",
                                &step.name,
                                SagaStatus::Running,
                                SagaStatus::Completed,
                            ),
                        )
                        .await?;

                    return Ok(StepOutcome::Completed(CompletedStep {
                        step,
                        actions: resolved.actions.clone(),
                    }));
                }
                Err(e) if step.can_retry() => {
                    let message = e.to_string();
                    step.record_retry(message.clone());
                    self.repositories.steps.save(&step).await?;
                    self.log
                        .warning(
                            instance.id,
                            Some(step.id),
                            format!(
                                "step '{}' attempt failed: {}; retrying ({}/{})",
                                step.name, message, step.retry_count, step.max_retries
                            ),
                        )
                        .await?;

                    tokio::time::sleep(self.config.retry_delay(step.retry_count)).await;
                }
                Err(e) => return self.fail_step(instance, step, e.to_string()).await,
            }
        }
    }

    async fn fail_step(
        &self,
        instance: &SagaInstance,
        mut step: SagaStep,
        reason: String,
    ) -> Result<StepOutcome> {
        step.fail(reason.clone());
        self.repositories.steps.save(&step).await?;
        self.log
            .error(
                instance.id,
                Some(step.id),
                format!(
                    "{}: {}",
                    transition_message("step", &step.name, SagaStatus::Running, SagaStatus::Failed),
                    reason
                ),
            )
            .await?;

        Ok(StepOutcome::Failed { step, reason })
    }

    /// Undo completed steps, highest order first. Every step is attempted;
    /// returns how many compensations failed.
    async fn compensate(
        &self,
        instance: &SagaInstance,
        mut completed: Vec<CompletedStep>,
    ) -> Result<usize> {
        completed.sort_by(|a, b| b.step.order.cmp(&a.step.order));

        info!(
            saga_id = %instance.id,
            steps_to_compensate = completed.len(),
            "Starting saga compensation"
        );

        let mut failures = 0;
        for CompletedStep { step, actions } in &completed {
            self.log
                .info(
                    instance.id,
                    Some(step.id),
                    format!("compensating step '{}'", step.name),
                )
                .await?;

            let ctx = self.step_context(instance, step);
            match self
                .invoke_compensation(actions, &ctx, step.payload.clone(), step.result.clone())
                .await
            {
                Ok(()) => {
                    self.log
                        .info(
                            instance.id,
                            Some(step.id),
                            format!("step '{}' compensated", step.name),
                        )
                        .await?;
                }
                Err(e) => {
                    failures += 1;
                    error!(
                        saga_id = %instance.id,
                        step_name = %step.name,
                        order = step.order,
                        error = %e,
                        "Saga step compensation failed"
                    );
                    self.log
                        .error(
                            instance.id,
                            Some(step.id),
                            format!("compensation of step '{}' failed: {}", step.name, e),
                        )
                        .await?;
                }
            }
        }

        Ok(failures)
    }

    async fn invoke_forward(
        &self,
        actions: &StepActions,
        ctx: &StepContext,
        payload: Value,
    ) -> Result<Value> {
        let call = actions.forward.execute(ctx, payload);
        match self.config.step_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| timeout_error(ctx, limit))?,
            None => call.await,
        }
    }

    async fn invoke_compensation(
        &self,
        actions: &StepActions,
        ctx: &StepContext,
        payload: Value,
        result: Option<Value>,
    ) -> Result<()> {
        let call = actions.compensate.compensate(ctx, payload, result);
        match self.config.step_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| timeout_error(ctx, limit))?,
            None => call.await,
        }
    }

    fn step_context(&self, instance: &SagaInstance, step: &SagaStep) -> StepContext {
        StepContext::new(
            instance.id,
            self.name.clone(),
            step.id,
            step.name.clone(),
            step.order,
            step.retry_count,
            instance.correlation_id,
            instance.tenant_id.clone(),
            self.executor.clone(),
        )
    }
}

#[async_trait]
impl TriggerHandler for SagaOrchestrator {
    async fn handle_trigger(&self, trigger: SagaTrigger) -> Result<Uuid> {
        self.handle(trigger).await
    }

    fn handler_name(&self) -> &'static str {
        "saga-orchestrator"
    }
}

fn transition_message(entity: &str, name: &str, from: SagaStatus, to: SagaStatus) -> String {
    format!(
        "{} '{}' {} -> {}",
        entity,
        name,
        from.as_str(),
        to.as_str()
    )
}

fn timeout_error(ctx: &StepContext, limit: std::time::Duration) -> AppError {
    AppError::StepTimeout {
        step: ctx.step_name.clone(),
        timeout_ms: limit.as_millis() as u64,
    }
}
