//! EventDispatcher
//!
//! Owns the registration phase (via the builder), the per-message
//! dispatch cycle, and the wiring of the dispatch callback onto a
//! delivery transport.
//!
//! Dispatch cycle for one delivered message:
//! 1. Adapt the raw message, extracting event name and payload
//! 2. Look up the registry entry; no entry means ack and drop
//! 3. Ack early when the entry opted out of late acking
//! 4. Shape handler arguments (`data`, plus `event_name` on opt-in)
//! 5. Run the immediate handler, or submit the deferred task
//! 6. Final ack, unconditional and idempotent

use std::sync::Arc;

use contracts::{
    BindingKind, ContractError, CredentialsContext, EventBinding, MessageCallback, PullTransport,
    RawMessage, Subscription, TaskBackend, TaskRef,
};
use tracing::{info, warn};

use crate::error::DispatchError;
use crate::message::{AckPath, InboundMessage};
use crate::metrics::DispatchMetrics;
use crate::registry::{HandlerArgs, HandlerFn, HandlerOptions, HandlerRegistry, HandlerTarget};

impl From<&EventBinding> for HandlerOptions {
    fn from(binding: &EventBinding) -> Self {
        Self {
            ack_late: binding.ack_late,
            send_event: binding.send_event,
        }
    }
}

/// Builder owning the registration phase
///
/// `build` seals the registry. There is no way to register a handler on
/// a running dispatcher, which makes registration-before-dispatch a
/// structural property rather than a convention.
pub struct EventDispatcherBuilder {
    topic: String,
    name: String,
    registry: HandlerRegistry,
    backend: Arc<dyn TaskBackend>,
}

impl EventDispatcherBuilder {
    /// Start building a dispatcher for `topic` under `name`
    pub fn new(
        topic: impl Into<String>,
        name: impl Into<String>,
        backend: Arc<dyn TaskBackend>,
    ) -> Self {
        Self {
            topic: topic.into(),
            name: name.into(),
            registry: HandlerRegistry::new(),
            backend,
        }
    }

    /// Register a synchronous handler for an event
    pub fn register_handler<F>(
        mut self,
        event_name: impl Into<String>,
        handler_name: impl Into<String>,
        handler: F,
        options: HandlerOptions,
    ) -> Self
    where
        F: Fn(HandlerArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.registry
            .register_handler(event_name, handler_name, handler, options);
        self
    }

    /// Register a deferred task for an event
    pub fn register_task(
        mut self,
        event_name: impl Into<String>,
        task: TaskRef,
        options: HandlerOptions,
    ) -> Self {
        self.registry.register_task(event_name, task, options);
        self
    }

    /// Register every binding from a blueprint routing table
    ///
    /// `resolve` maps an immediate binding's handler name to code; task
    /// bindings resolve by name inside the backend and need no lookup
    /// here.
    ///
    /// # Errors
    /// Returns `ConfigValidation` when an immediate handler name does
    /// not resolve
    pub fn apply_bindings<R>(
        mut self,
        bindings: &[EventBinding],
        resolve: R,
    ) -> Result<Self, ContractError>
    where
        R: Fn(&str) -> Option<HandlerFn>,
    {
        for binding in bindings {
            let options = HandlerOptions::from(binding);
            match binding.kind {
                BindingKind::Immediate => {
                    let handler = resolve(&binding.handler).ok_or_else(|| {
                        ContractError::config_validation(
                            format!("events[event={}].handler", binding.event),
                            format!("unknown handler '{}'", binding.handler),
                        )
                    })?;
                    self.registry.register_handler_fn(
                        &binding.event,
                        &binding.handler,
                        handler,
                        options,
                    );
                }
                BindingKind::Task => {
                    self.registry
                        .register_task(&binding.event, TaskRef::new(&binding.handler), options);
                }
            }
        }
        Ok(self)
    }

    /// Seal the registry and create the dispatcher
    pub fn build(self) -> EventDispatcher {
        let desc = format!("EventDispatcher {} ({})", self.name, self.topic);
        info!(
            dispatcher = %desc,
            handlers = self.registry.len(),
            backend = %self.backend.name(),
            "dispatcher created"
        );
        EventDispatcher {
            topic: self.topic,
            name: self.name,
            desc,
            registry: self.registry,
            backend: self.backend,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

/// Outcome of one dispatch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered handler processed the message
    Handled {
        event: String,
        handler: String,
        ack_path: AckPath,
    },
    /// No handler registered for the event; acknowledged and dropped
    Ignored { event: String },
}

/// Event dispatcher bound to one topic/consumer pair
pub struct EventDispatcher {
    topic: String,
    name: String,
    desc: String,
    registry: HandlerRegistry,
    backend: Arc<dyn TaskBackend>,
    metrics: Arc<DispatchMetrics>,
}

impl EventDispatcher {
    /// Topic this dispatcher consumes
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Consumer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered events
    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    /// Run one dispatch cycle for a delivered message
    ///
    /// # Errors
    /// `MalformedMessage`, `HandlerInvocation`, and `TaskSubmission`
    /// all leave the message unacknowledged (unless it was acked early),
    /// so the transport's redelivery loop owns the retry.
    pub fn dispatch(&self, raw: Arc<dyn RawMessage>) -> Result<DispatchOutcome, DispatchError> {
        let mut message = InboundMessage::from_raw(raw).map_err(|e| {
            self.metrics.record_malformed();
            warn!(dispatcher = %self.desc, error = %e, "rejecting malformed message");
            e
        })?;

        let Some(entry) = self.registry.lookup(message.event()) else {
            message.ack_final();
            self.metrics.record_ignored();
            info!(
                dispatcher = %self.desc,
                event = %message.event(),
                "event ignored, no handler registered"
            );
            return Ok(DispatchOutcome::Ignored {
                event: message.event().to_string(),
            });
        };

        // Early ack trades retry coverage for at-most-once execution: a
        // failure after this point loses the delivery instead of
        // retrying it.
        if !entry.ack_late {
            message.ack_early();
        }

        let args = HandlerArgs {
            data: message.data().to_string(),
            event_name: entry.send_event.then(|| message.event().to_string()),
        };

        match &entry.target {
            HandlerTarget::Immediate(handler) => {
                handler(args).map_err(|source| {
                    self.metrics.record_handler_failure();
                    DispatchError::HandlerInvocation {
                        event: message.event().to_string(),
                        handler: entry.name.clone(),
                        source,
                    }
                })?;
            }
            HandlerTarget::Deferred(task) => {
                self.backend
                    .submit(task, message.data(), message.event())
                    .map_err(|source| {
                        self.metrics.record_submission_failure();
                        DispatchError::TaskSubmission {
                            event: message.event().to_string(),
                            task: task.name.clone(),
                            source,
                        }
                    })?;
            }
        }

        // Unconditional final ack; the idempotent second ack when the
        // entry already acked early
        message.ack_final();
        self.metrics.record_dispatched();

        info!(
            dispatcher = %self.desc,
            event = %message.event(),
            handler = %entry.name,
            send_event = entry.send_event,
            "event processed"
        );

        Ok(DispatchOutcome::Handled {
            event: message.event().to_string(),
            handler: entry.name.clone(),
            ack_path: message.ack_path().unwrap_or(AckPath::Final),
        })
    }

    /// Attach this dispatcher to a transport
    ///
    /// Every delivered message on the topic runs through `dispatch`;
    /// dispatch errors cross the callback boundary as contract errors so
    /// the transport keeps the message on its redelivery loop.
    ///
    /// # Errors
    /// Returns `Subscribe` when the consumer cannot be attached
    pub fn start(
        self: &Arc<Self>,
        transport: &dyn PullTransport,
        credentials: &CredentialsContext,
    ) -> Result<Box<dyn Subscription>, ContractError> {
        let dispatcher = Arc::clone(self);
        let callback: MessageCallback = Arc::new(move |raw| {
            dispatcher
                .dispatch(raw)
                .map(|_| ())
                .map_err(ContractError::from)
        });

        let subscription = transport.subscribe(&self.topic, &self.name, callback, credentials)?;
        info!(dispatcher = %self.desc, "dispatcher started");
        Ok(subscription)
    }
}
