//! Handler registry
//!
//! Maps event names to handler descriptors. Built during the
//! registration phase, read-only once dispatching starts. Registration
//! is last-write-wins: re-registering an event replaces the previous
//! entry without error.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::TaskRef;
use tracing::info;

/// Arguments handed to an immediate handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerArgs {
    /// Decoded message payload, always present
    pub data: String,

    /// Event name, present only when the entry opted in via `send_event`
    pub event_name: Option<String>,
}

/// Immediate handler callable
pub type HandlerFn = Arc<dyn Fn(HandlerArgs) -> anyhow::Result<()> + Send + Sync>;

/// Execution target of a registered event
#[derive(Clone)]
pub enum HandlerTarget {
    /// Synchronous in-process callable
    Immediate(HandlerFn),
    /// Task handed off to the deferred backend
    Deferred(TaskRef),
}

impl std::fmt::Debug for HandlerTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(_) => write!(f, "Immediate(..)"),
            Self::Deferred(task) => write!(f, "Deferred({})", task.name),
        }
    }
}

/// Acknowledgment and argument-shaping policy for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Acknowledge only after the handler/submission succeeds
    pub ack_late: bool,

    /// Forward the event name in the handler arguments
    pub send_event: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            ack_late: true,
            send_event: false,
        }
    }
}

impl HandlerOptions {
    /// Acknowledge before invocation, trading retry coverage for
    /// at-most-once handler execution
    pub fn ack_early() -> Self {
        Self {
            ack_late: false,
            ..Self::default()
        }
    }

    /// Forward the event name alongside the payload
    pub fn with_event_name() -> Self {
        Self {
            send_event: true,
            ..Self::default()
        }
    }
}

/// One registered reaction to an event name
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Handler or task name, used for diagnostics and outcomes
    pub name: String,

    /// What to execute when the event arrives
    pub target: HandlerTarget,

    /// Acknowledge only after success
    pub ack_late: bool,

    /// Forward the event name in the arguments
    pub send_event: bool,
}

/// Event name to handler descriptor mapping
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous handler for an event
    pub fn register_handler<F>(
        &mut self,
        event_name: impl Into<String>,
        handler_name: impl Into<String>,
        handler: F,
        options: HandlerOptions,
    ) where
        F: Fn(HandlerArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register_handler_fn(event_name, handler_name, Arc::new(handler), options);
    }

    /// Register an already-boxed handler function
    pub fn register_handler_fn(
        &mut self,
        event_name: impl Into<String>,
        handler_name: impl Into<String>,
        handler: HandlerFn,
        options: HandlerOptions,
    ) {
        let event_name = event_name.into();
        let handler_name = handler_name.into();
        info!(
            event = %event_name,
            handler = %handler_name,
            ack_late = options.ack_late,
            send_event = options.send_event,
            "event handler registered"
        );
        self.entries.insert(
            event_name,
            RegistryEntry {
                name: handler_name,
                target: HandlerTarget::Immediate(handler),
                ack_late: options.ack_late,
                send_event: options.send_event,
            },
        );
    }

    /// Register a deferred task for an event
    pub fn register_task(
        &mut self,
        event_name: impl Into<String>,
        task: TaskRef,
        options: HandlerOptions,
    ) {
        let event_name = event_name.into();
        info!(
            event = %event_name,
            task = %task.name,
            ack_late = options.ack_late,
            send_event = options.send_event,
            "event task registered"
        );
        self.entries.insert(
            event_name,
            RegistryEntry {
                name: task.name.clone(),
                target: HandlerTarget::Deferred(task),
                ack_late: options.ack_late,
                send_event: options.send_event,
            },
        );
    }

    /// Look up the entry for an event name, exact case-sensitive match
    ///
    /// Absence is a valid outcome, not an error: unregistered events are
    /// acknowledged and dropped by the dispatcher.
    pub fn lookup(&self, event_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(event_name)
    }

    /// Number of registered events
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered event names, unordered
    pub fn registered_events(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
