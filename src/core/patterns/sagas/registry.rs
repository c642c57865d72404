//! Step action registry
//!
//! Explicit table from step kind to its (forward, compensating) action pair.
//! Built once when saga definitions are assembled; lookups never mutate it.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use super::context::StepContext;
use crate::error::{AppError, Result};

/// Forward action of a saga step
#[async_trait]
pub trait ForwardAction: Send + Sync {
    /// Perform the step and return its structured result
    async fn execute(&self, ctx: &StepContext, payload: Value) -> Result<Value>;
}

/// Undo of a completed forward action
#[async_trait]
pub trait CompensatingAction: Send + Sync {
    /// Receives the payload and result of the forward action being undone
    async fn compensate(&self, ctx: &StepContext, payload: Value, result: Option<Value>)
        -> Result<()>;
}

/// The resolved action pair for one step kind
#[derive(Clone)]
pub struct StepActions {
    pub forward: Arc<dyn ForwardAction>,
    pub compensate: Arc<dyn CompensatingAction>,
}

#[derive(Default, Clone)]
pub struct StepActionRegistry {
    actions: HashMap<String, StepActions>,
}

impl StepActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the action pair for `kind`. Registering a kind twice is a
    /// configuration error.
    pub fn register<F, C>(&mut self, kind: impl Into<String>, forward: F, compensate: C) -> Result<()>
    where
        F: ForwardAction + 'static,
        C: CompensatingAction + 'static,
    {
        let kind = kind.into();
        if self.actions.contains_key(&kind) {
            return Err(AppError::DuplicateStepKind(kind));
        }

        debug!(step_kind = %kind, "Registered saga step actions");
        self.actions.insert(
            kind,
            StepActions {
                forward: Arc::new(forward),
                compensate: Arc::new(compensate),
            },
        );
        Ok(())
    }

    /// Register async closures as the action pair for `kind`
    pub fn register_fn<F, FFut, C, CFut>(
        &mut self,
        kind: impl Into<String>,
        forward: F,
        compensate: C,
    ) -> Result<()>
    where
        F: Fn(StepContext, Value) -> FFut + Send + Sync + 'static,
        FFut: Future<Output = Result<Value>> + Send + 'static,
        C: Fn(StepContext, Value, Option<Value>) -> CFut + Send + Sync + 'static,
        CFut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(kind, forward_fn(forward), compensate_fn(compensate))
    }

    /// Register a step whose actions issue commands through the executor.
    ///
    /// The forward command receives the step payload. The compensating
    /// command receives `{"payload": .., "result": ..}` of the forward run.
    pub fn register_command_step(
        &mut self,
        kind: impl Into<String>,
        forward_command: impl Into<String>,
        compensating_command: impl Into<String>,
    ) -> Result<()> {
        self.register(
            kind,
            CommandForward {
                command: forward_command.into(),
            },
            CommandCompensation {
                command: compensating_command.into(),
            },
        )
    }

    pub fn resolve(&self, kind: &str) -> Result<StepActions> {
        self.actions
            .get(kind)
            .cloned()
            .ok_or_else(|| AppError::UnknownStepKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.actions.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Wrap an async closure as a `ForwardAction`
pub fn forward_fn<F, Fut>(f: F) -> FnForward<F, Fut>
where
    F: Fn(StepContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    FnForward {
        f,
        _phantom: PhantomData,
    }
}

/// Wrap an async closure as a `CompensatingAction`
pub fn compensate_fn<F, Fut>(f: F) -> FnCompensation<F, Fut>
where
    F: Fn(StepContext, Value, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnCompensation {
        f,
        _phantom: PhantomData,
    }
}

pub struct FnForward<F, Fut> {
    f: F,
    _phantom: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> ForwardAction for FnForward<F, Fut>
where
    F: Fn(StepContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn execute(&self, ctx: &StepContext, payload: Value) -> Result<Value> {
        (self.f)(ctx.clone(), payload).await
    }
}

pub struct FnCompensation<F, Fut> {
    f: F,
    _phantom: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> CompensatingAction for FnCompensation<F, Fut>
where
    F: Fn(StepContext, Value, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn compensate(
        &self,
        ctx: &StepContext,
        payload: Value,
        result: Option<Value>,
    ) -> Result<()> {
        (self.f)(ctx.clone(), payload, result).await
    }
}

/// Compensation for steps with nothing to undo
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompensation;

#[async_trait]
impl CompensatingAction for NoCompensation {
    async fn compensate(
        &self,
        ctx: &StepContext,
        _payload: Value,
        _result: Option<Value>,
    ) -> Result<()> {
        debug!(
            saga_id = %ctx.saga_instance_id,
            step_name = %ctx.step_name,
            "Step has no compensation"
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CommandForward {
    command: String,
}

#[async_trait]
impl ForwardAction for CommandForward {
    async fn execute(&self, ctx: &StepContext, payload: Value) -> Result<Value> {
        ctx.execute_command(self.command.as_str(), payload).await
    }
}

#[derive(Debug, Clone)]
struct CommandCompensation {
    command: String,
}

#[async_trait]
impl CompensatingAction for CommandCompensation {
    async fn compensate(
        &self,
        ctx: &StepContext,
        payload: Value,
        result: Option<Value>,
    ) -> Result<()> {
        ctx.execute_command(
            self.command.as_str(),
            json!({ "payload": payload, "result": result }),
        )
        .await
        .map(|_| ())
    }
}
