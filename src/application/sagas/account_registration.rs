//! Account registration saga
//!
//! Creates the user record, then the credential for it. If the credential
//! cannot be created the user record is deleted again.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::SagaConfig;
use crate::core::patterns::commands::CommandExecutor;
use crate::core::patterns::sagas::{
    PayloadInput, SagaDefinition, SagaOrchestrator, SagaRepositories, StepActionRegistry,
    StepDefinition,
};
use crate::error::{AppError, Result};

pub const ACCOUNT_REGISTRATION: &str = "account-registration";
pub const CREATE_USER: &str = "create-user";
pub const CREATE_CREDENTIAL: &str = "create-credential";

pub const USER_CREATE_COMMAND: &str = "user.create";
pub const USER_DELETE_COMMAND: &str = "user.delete";
pub const AUTH_CREATE_COMMAND: &str = "auth.create";
pub const AUTH_DELETE_COMMAND: &str = "auth.delete";

/// Register the step kinds this saga uses
pub fn register_actions(registry: &mut StepActionRegistry) -> Result<()> {
    registry.register_command_step(CREATE_USER, USER_CREATE_COMMAND, USER_DELETE_COMMAND)?;
    registry.register_command_step(
        CREATE_CREDENTIAL,
        AUTH_CREATE_COMMAND,
        AUTH_DELETE_COMMAND,
    )?;
    Ok(())
}

pub fn definition() -> SagaDefinition {
    SagaDefinition::new(ACCOUNT_REGISTRATION)
        .step(StepDefinition::new(CREATE_USER, CREATE_USER).with_payload(user_payload))
        .step(
            StepDefinition::new(CREATE_CREDENTIAL, CREATE_CREDENTIAL)
                .with_payload(credential_payload),
        )
}

/// Orchestrator for account registration with its own registry
pub fn orchestrator(
    repositories: SagaRepositories,
    executor: Arc<dyn CommandExecutor>,
    config: SagaConfig,
) -> Result<SagaOrchestrator> {
    let mut registry = StepActionRegistry::new();
    register_actions(&mut registry)?;
    SagaOrchestrator::new(definition(), &registry, repositories, executor, config)
}

fn user_payload(input: &PayloadInput<'_>) -> Result<Value> {
    let trigger = &input.trigger.payload;
    let email = required_str(trigger, "email")?;

    let mut payload = json!({ "email": email });
    if let Some(name) = trigger.get("name") {
        payload["name"] = name.clone();
    }
    Ok(payload)
}

fn credential_payload(input: &PayloadInput<'_>) -> Result<Value> {
    let trigger = &input.trigger.payload;
    let user = input.require_result(CREATE_USER)?;
    let user_id = user.get("id").cloned().ok_or_else(|| {
        AppError::ValidationError(format!("'{}' result has no user id", CREATE_USER))
    })?;

    Ok(json!({
        "user_id": user_id,
        "email": required_str(trigger, "email")?,
        "password": required_str(trigger, "password")?,
    }))
}

fn required_str<'a>(payload: &'a Value, field: &str) -> Result<&'a str> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::ValidationError(format!("Missing field: {}", field)))
}
