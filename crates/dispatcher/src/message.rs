//! Inbound message adapter
//!
//! Wraps a raw transport message and eagerly extracts the routing fields
//! the dispatch cycle needs. Construction fails when the event-name
//! attribute is absent, so everything downstream can assume an event name
//! is present.

use std::sync::Arc;

use contracts::{RawMessage, EVENT_ATTRIBUTE};

use crate::error::DispatchError;

/// Which acknowledgment operation fired first for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPath {
    /// Acknowledged before handler invocation (`ack_late == false`)
    Early,
    /// Acknowledged after successful handling
    Final,
}

/// Decoded view over one delivered message
pub struct InboundMessage {
    raw: Arc<dyn RawMessage>,
    event: String,
    data: String,
    ack_path: Option<AckPath>,
}

impl InboundMessage {
    /// Adapt a raw message, extracting the event name and payload
    ///
    /// The payload is opaque to the dispatch layer; it is decoded to a
    /// string for handler arguments (lossy on invalid UTF-8) and never
    /// parsed.
    ///
    /// # Errors
    /// Returns `MalformedMessage` when the event attribute is missing.
    /// The raw message is left unacknowledged so the transport retries
    /// and eventually expires it.
    pub fn from_raw(raw: Arc<dyn RawMessage>) -> Result<Self, DispatchError> {
        let event = raw.attribute(EVENT_ATTRIBUTE).ok_or_else(|| {
            DispatchError::malformed(format!(
                "message {} has no '{EVENT_ATTRIBUTE}' attribute",
                raw.id()
            ))
        })?;
        let data = String::from_utf8_lossy(&raw.payload()).into_owned();

        Ok(Self {
            raw,
            event,
            data,
            ack_path: None,
        })
    }

    /// Event name extracted from the message attributes
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Decoded payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Transport message id
    pub fn id(&self) -> u64 {
        self.raw.id()
    }

    /// Delivery attempt counter (1 on first delivery)
    pub fn delivery_attempt(&self) -> u32 {
        self.raw.delivery_attempt()
    }

    /// Acknowledge before handler invocation
    pub fn ack_early(&mut self) {
        self.acknowledge(AckPath::Early);
    }

    /// Acknowledge after the handling step
    ///
    /// When the message was already acked early this is the idempotent
    /// second ack; the recorded path stays `Early`.
    pub fn ack_final(&mut self) {
        self.acknowledge(AckPath::Final);
    }

    fn acknowledge(&mut self, path: AckPath) {
        self.raw.ack();
        if self.ack_path.is_none() {
            self.ack_path = Some(path);
        }
    }

    /// Which ack operation fired first, if any
    pub fn ack_path(&self) -> Option<AckPath> {
        self.ack_path
    }

    /// Whether the underlying raw message is acknowledged
    pub fn is_acked(&self) -> bool {
        self.raw.is_acked()
    }
}
