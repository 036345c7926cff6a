//! PullTransport trait - delivery transport abstraction
//!
//! Defines a unified interface for pull-based subscription transports,
//! decoupling the dispatcher from concrete delivery implementations.
//! Supports unified handling of the in-memory transport and real brokers.

use std::sync::Arc;

use crate::{ContractError, RawMessage};

/// Message delivery callback type
///
/// Invoked once per delivered message with a raw message handle. The
/// transport may invoke it concurrently across distinct messages. An
/// `Err` return leaves the message unacknowledged, so the transport
/// redelivers it after the ack deadline.
pub type MessageCallback =
    Arc<dyn Fn(Arc<dyn RawMessage>) -> Result<(), ContractError> + Send + Sync>;

/// Credential/project scoping handed to the transport at subscribe time
#[derive(Debug, Clone, Default)]
pub struct CredentialsContext {
    /// Cloud project id, when the transport is project-scoped
    pub project_id: Option<String>,
}

impl CredentialsContext {
    /// Context scoped to a specific project
    pub fn with_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
        }
    }
}

/// Pull-based subscription transport
///
/// All delivery transports implement this trait.
pub trait PullTransport: Send + Sync {
    /// Attach a consumer to `topic` under `consumer` name
    ///
    /// The callback is invoked once per delivered message until the
    /// returned subscription is stopped.
    ///
    /// # Errors
    /// Returns `Subscribe` error when the consumer cannot be attached
    fn subscribe(
        &self,
        topic: &str,
        consumer: &str,
        callback: MessageCallback,
        credentials: &CredentialsContext,
    ) -> Result<Box<dyn Subscription>, ContractError>;
}

/// Handle to an active subscription
pub trait Subscription: Send + Sync {
    /// Topic this subscription consumes
    fn topic(&self) -> &str;

    /// Consumer name (diagnostics/log correlation)
    fn consumer(&self) -> &str;

    /// Stop delivery to this consumer. Idempotent.
    fn stop(&self);

    /// Whether delivery is still active
    fn is_active(&self) -> bool;
}
