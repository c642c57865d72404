//! Domain events that start sagas
//!
//! An external delivery mechanism hands `SagaTrigger` events to a
//! `TriggerHandler`. Delivery guarantees are the deliverer's concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;

/// Core trait that all domain events must implement
pub trait DomainEvent: Send + Sync + std::fmt::Debug + Serialize {
    /// Get the event type identifier
    fn event_type(&self) -> &'static str;

    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get when this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Get the correlation ID for tracing
    fn correlation_id(&self) -> Uuid;

    /// Get event version for schema evolution
    fn version(&self) -> u32 {
        1
    }

    fn metadata(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// The event that starts one saga instance.
///
/// Cross-cutting context (correlation and tenant) travels explicitly with
/// the trigger and is threaded to every action invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SagaTrigger {
    pub event_id: Uuid,
    pub saga_name: String,
    pub correlation_id: Uuid,
    pub tenant_id: Option<String>,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl SagaTrigger {
    pub fn new(saga_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            saga_name: saga_name.into(),
            correlation_id: Uuid::new_v4(),
            tenant_id: None,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

impl DomainEvent for SagaTrigger {
    fn event_type(&self) -> &'static str {
        "saga.triggered"
    }

    fn aggregate_id(&self) -> Uuid {
        self.event_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("saga_name".to_string(), self.saga_name.clone());
        if let Some(tenant_id) = &self.tenant_id {
            metadata.insert("tenant_id".to_string(), tenant_id.clone());
        }
        metadata
    }
}

/// Receives saga triggers from the event deliverer
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    /// Start a saga for the trigger and return the new instance id
    async fn handle_trigger(&self, trigger: SagaTrigger) -> Result<Uuid>;

    /// Get handler name for logging and debugging
    fn handler_name(&self) -> &'static str;
}
