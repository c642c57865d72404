//! Saga definitions
//!
//! A definition is the ordered list of steps a saga kind runs. Definitions
//! are checked against the action registry when an orchestrator is built, so
//! an unknown step kind fails at startup and never at per-instance runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::registry::StepActionRegistry;
use crate::core::patterns::events::SagaTrigger;
use crate::error::{AppError, Result};

/// Computes a step payload from the trigger and earlier step results
pub type PayloadBuilder = Arc<dyn Fn(&PayloadInput<'_>) -> Result<Value> + Send + Sync>;

/// Inputs available when a step payload is computed
pub struct PayloadInput<'a> {
    pub trigger: &'a SagaTrigger,
    results: &'a [(String, Value)],
}

impl<'a> PayloadInput<'a> {
    pub fn new(trigger: &'a SagaTrigger, results: &'a [(String, Value)]) -> Self {
        Self { trigger, results }
    }

    /// Result of an earlier completed step, by step name
    pub fn result_of(&self, step_name: &str) -> Option<&'a Value> {
        let results = self.results;
        results
            .iter()
            .find(|(name, _)| name == step_name)
            .map(|(_, value)| value)
    }

    pub fn results(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        let results = self.results;
        results.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Like `result_of`, but a missing result is a validation error
    pub fn require_result(&self, step_name: &str) -> Result<&'a Value> {
        self.result_of(step_name).ok_or_else(|| {
            AppError::ValidationError(format!("No result recorded for step '{}'", step_name))
        })
    }
}

/// The trigger payload; object payloads also get earlier results under
/// `"results"`, keyed by step name.
pub fn default_payload(input: &PayloadInput<'_>) -> Result<Value> {
    let mut payload = input.trigger.payload.clone();
    if let Value::Object(map) = &mut payload {
        if !input.results.is_empty() {
            let results: serde_json::Map<String, Value> = input
                .results()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();
            map.insert("results".to_string(), Value::Object(results));
        }
    }
    Ok(payload)
}

#[derive(Clone)]
pub struct StepDefinition {
    pub name: String,
    pub kind: String,
    /// Falls back to the configured default when unset
    pub max_retries: Option<u32>,
    payload: Option<PayloadBuilder>,
}

impl StepDefinition {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            max_retries: None,
            payload: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_payload<F>(mut self, builder: F) -> Self
    where
        F: Fn(&PayloadInput<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.payload = Some(Arc::new(builder));
        self
    }

    pub fn build_payload(&self, input: &PayloadInput<'_>) -> Result<Value> {
        match &self.payload {
            Some(builder) => builder(input),
            None => default_payload(input),
        }
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("max_retries", &self.max_retries)
            .field("custom_payload", &self.payload.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SagaDefinition {
    name: String,
    steps: Vec<StepDefinition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SagaDefinitionFile {
    name: String,
    steps: Vec<StepDefinitionFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StepDefinitionFile {
    name: String,
    kind: Option<String>,
    max_retries: Option<u32>,
}

impl SagaDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step; steps run in the order they are added
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Load a definition from YAML. Steps without a `kind` use their name.
    ///
    /// ```yaml
    /// name: account-registration
    /// steps:
    ///   - name: create-user
    ///     max_retries: 2
    ///   - name: create-credential
    /// ```
    pub fn from_yaml(source: &str) -> Result<Self> {
        let file: SagaDefinitionFile = serde_yaml::from_str(source)?;
        let steps = file
            .steps
            .into_iter()
            .map(|step| {
                let kind = step.kind.unwrap_or_else(|| step.name.clone());
                let mut definition = StepDefinition::new(step.name, kind);
                definition.max_retries = step.max_retries;
                definition
            })
            .collect();

        Ok(Self {
            name: file.name,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Check the definition is well formed and every step kind is registered
    pub fn validate(&self, registry: &StepActionRegistry) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Saga definition name cannot be empty".to_string(),
            ));
        }

        if self.steps.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Saga definition '{}' has no steps",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "Saga definition '{}' declares step '{}' twice",
                    self.name, step.name
                )));
            }
            if !registry.contains(&step.kind) {
                return Err(AppError::UnknownStepKind(step.kind.clone()));
            }
        }

        Ok(())
    }
}
