//! SubscriberBlueprint - Config Loader output
//!
//! Describes a complete subscriber setup: topic binding, delivery policy,
//! and the declarative event routing table.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DeliveryConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete subscriber configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Subscriber identity and topic binding
    pub subscriber: SubscriberSettings,

    /// Delivery/redelivery policy
    #[serde(default)]
    pub delivery: DeliverySettings,

    /// Declarative event routing table
    #[serde(default)]
    pub events: Vec<EventBinding>,
}

/// Subscriber identity: topic, consumer name, optional project scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberSettings {
    /// Topic to consume (e.g., "orders")
    pub topic: String,

    /// Consumer/subscription name, used for diagnostics and log correlation
    pub name: String,

    /// Cloud project id (optional)
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Delivery policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySettings {
    /// Ack deadline before redelivery (milliseconds), must be > 0
    #[serde(default = "default_ack_deadline_ms")]
    pub ack_deadline_ms: u64,

    /// Total delivery attempts before a message is dropped, must be >= 1
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u32,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            ack_deadline_ms: default_ack_deadline_ms(),
            max_deliveries: default_max_deliveries(),
        }
    }
}

fn default_ack_deadline_ms() -> u64 {
    10_000
}

fn default_max_deliveries() -> u32 {
    5
}

/// One event-to-handler binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBinding {
    /// Event name (routing key, case-sensitive exact match)
    pub event: String,

    /// Handler or task name, resolved to code at startup
    pub handler: String,

    /// Execution kind
    #[serde(default)]
    pub kind: BindingKind,

    /// Acknowledge only after the handler/submission succeeds
    #[serde(default = "default_ack_late")]
    pub ack_late: bool,

    /// Forward the event name to the handler alongside the payload
    #[serde(default)]
    pub send_event: bool,
}

fn default_ack_late() -> bool {
    true
}

/// Handler execution kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    /// Synchronous in-process handler
    #[default]
    Immediate,
    /// Deferred task handed to the external backend
    Task,
}

impl SubscriberBlueprint {
    /// Build the runtime delivery configuration from blueprint data
    pub fn to_delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            ack_deadline: Duration::from_millis(self.delivery.ack_deadline_ms),
            max_deliveries: self.delivery.max_deliveries,
        }
    }
}
