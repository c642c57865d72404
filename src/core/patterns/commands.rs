//! Command execution contract
//!
//! Forward and compensating actions reach the outside world only through a
//! `CommandExecutor`. The saga core never knows what a command does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// A named command with its payload and the context it was issued in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandDescriptor {
    pub command_id: Uuid,
    pub name: String,
    pub payload: serde_json::Value,
    pub correlation_id: Uuid,
    pub tenant_id: Option<String>,
    pub saga_instance_id: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, payload: serde_json::Value, correlation_id: Uuid) -> Self {
        Self {
            command_id: Uuid::new_v4(),
            name: name.into(),
            payload,
            correlation_id,
            tenant_id: None,
            saga_instance_id: None,
            issued_at: Utc::now(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: Option<String>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn with_saga_instance(mut self, saga_instance_id: Uuid) -> Self {
        self.saga_instance_id = Some(saga_instance_id);
        self
    }
}

/// Executes commands on behalf of saga actions
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute the command and return its structured result
    async fn execute(&self, command: CommandDescriptor) -> Result<serde_json::Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_builder_threads_context() {
        let correlation_id = Uuid::new_v4();
        let saga_id = Uuid::new_v4();
        let command = CommandDescriptor::new("user.create", json!({"email": "a@b.c"}), correlation_id)
            .with_tenant(Some("acme".to_string()))
            .with_saga_instance(saga_id);

        assert_eq!(command.name, "user.create");
        assert_eq!(command.correlation_id, correlation_id);
        assert_eq!(command.tenant_id.as_deref(), Some("acme"));
        assert_eq!(command.saga_instance_id, Some(saga_id));
        assert!(!command.command_id.is_nil());
    }
}
