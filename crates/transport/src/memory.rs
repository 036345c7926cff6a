//! In-memory transport
//!
//! For tests and demos without a real broker. Honors the at-least-once
//! contract: a message stays on the redelivery loop until acknowledged or
//! until `max_deliveries` attempts are exhausted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{
    ContractError, CredentialsContext, DeliveryConfig, MessageCallback, PullTransport, RawMessage,
    Subscription, EVENT_ATTRIBUTE,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::TransportMetrics;

/// In-memory message
///
/// Each consumer of a topic gets its own instance with independent ack
/// state; redeliveries reuse the instance with a bumped attempt counter.
pub struct MemoryMessage {
    id: u64,
    attributes: HashMap<String, String>,
    payload: Bytes,
    acked: AtomicBool,
    attempt: AtomicU32,
}

impl RawMessage for MemoryMessage {
    fn id(&self) -> u64 {
        self.id
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.get(key).cloned()
    }

    fn payload(&self) -> Bytes {
        self.payload.clone()
    }

    fn ack(&self) {
        self.acked.store(true, Ordering::SeqCst);
    }

    fn is_acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }

    fn delivery_attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }
}

struct ConsumerEntry {
    name: String,
    callback: MessageCallback,
    active: Arc<AtomicBool>,
}

/// In-memory at-least-once transport
pub struct MemoryTransport {
    config: DeliveryConfig,
    consumers: Mutex<HashMap<String, Vec<ConsumerEntry>>>,
    metrics: Arc<TransportMetrics>,
    next_id: AtomicU64,
}

impl MemoryTransport {
    /// Create a new transport with the given delivery configuration
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            consumers: Mutex::new(HashMap::new()),
            metrics: Arc::new(TransportMetrics::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<TransportMetrics> {
        self.metrics.clone()
    }

    /// Publish a payload under an event name
    ///
    /// The event name is carried in the `event` attribute, matching the
    /// layout the dispatcher extracts from.
    pub fn publish(&self, topic: &str, event_name: &str, payload: impl Into<Bytes>) {
        let attributes = HashMap::from([(EVENT_ATTRIBUTE.to_string(), event_name.to_string())]);
        self.publish_with_attributes(topic, attributes, payload);
    }

    /// Publish with arbitrary attributes
    ///
    /// Messages without an `event` attribute are deliverable; rejecting
    /// them is the dispatcher's policy, not the transport's.
    pub fn publish_with_attributes(
        &self,
        topic: &str,
        attributes: HashMap<String, String>,
        payload: impl Into<Bytes>,
    ) {
        let payload = payload.into();
        self.metrics.record_published();

        let consumers = self
            .consumers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for entry in consumers.get(topic).into_iter().flatten() {
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }

            let message = Arc::new(MemoryMessage {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                attributes: attributes.clone(),
                payload: payload.clone(),
                acked: AtomicBool::new(false),
                attempt: AtomicU32::new(0),
            });

            tokio::spawn(deliver(
                message,
                entry.callback.clone(),
                entry.active.clone(),
                self.config.clone(),
                self.metrics.clone(),
                topic.to_string(),
                entry.name.clone(),
            ));
        }
    }
}

/// Delivery loop for one message to one consumer
///
/// Invokes the callback, then waits out the ack deadline and redelivers
/// while the message remains unacknowledged.
async fn deliver(
    message: Arc<MemoryMessage>,
    callback: MessageCallback,
    active: Arc<AtomicBool>,
    config: DeliveryConfig,
    metrics: Arc<TransportMetrics>,
    topic: String,
    consumer: String,
) {
    loop {
        if !active.load(Ordering::SeqCst) {
            debug!(
                topic = %topic,
                consumer = %consumer,
                message_id = message.id(),
                "consumer stopped, abandoning delivery"
            );
            break;
        }

        let attempt = message.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        metrics.record_delivered();
        if attempt > 1 {
            metrics.record_redelivered();
            debug!(
                topic = %topic,
                consumer = %consumer,
                message_id = message.id(),
                attempt,
                "redelivering unacknowledged message"
            );
        }

        let raw: Arc<dyn RawMessage> = message.clone();
        if let Err(e) = (callback)(raw) {
            metrics.record_dispatch_error();
            warn!(
                topic = %topic,
                consumer = %consumer,
                message_id = message.id(),
                attempt,
                error = %e,
                "message callback failed"
            );
        }

        if message.is_acked() {
            break;
        }

        if attempt >= config.max_deliveries {
            metrics.record_expired();
            warn!(
                topic = %topic,
                consumer = %consumer,
                message_id = message.id(),
                attempts = attempt,
                "message never acknowledged, dropping after max deliveries"
            );
            break;
        }

        sleep(config.ack_deadline).await;

        if message.is_acked() {
            break;
        }
    }
}

impl PullTransport for MemoryTransport {
    fn subscribe(
        &self,
        topic: &str,
        consumer: &str,
        callback: MessageCallback,
        credentials: &CredentialsContext,
    ) -> Result<Box<dyn Subscription>, ContractError> {
        let active = Arc::new(AtomicBool::new(true));

        let mut consumers = self
            .consumers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        consumers.entry(topic.to_string()).or_default().push(ConsumerEntry {
            name: consumer.to_string(),
            callback,
            active: active.clone(),
        });

        info!(
            topic = %topic,
            consumer = %consumer,
            project_id = ?credentials.project_id,
            "consumer attached"
        );

        Ok(Box::new(MemorySubscription {
            topic: topic.to_string(),
            consumer: consumer.to_string(),
            active,
        }))
    }
}

/// Handle to an active in-memory subscription
pub struct MemorySubscription {
    topic: String,
    consumer: String,
    active: Arc<AtomicBool>,
}

impl Subscription for MemorySubscription {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn consumer(&self) -> &str {
        &self.consumer
    }

    fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        info!(topic = %self.topic, consumer = %self.consumer, "consumer stopped");
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
