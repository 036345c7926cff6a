//! RawMessage trait - raw transport message handle
//!
//! Defines the minimal surface the dispatcher requires from a delivered
//! message, decoupling it from concrete transport implementations.

use bytes::Bytes;

/// Transport-level attribute key carrying the event name.
pub const EVENT_ATTRIBUTE: &str = "event";

/// Raw transport message handle
///
/// One instance per delivery attempt stream: redeliveries of the same
/// message reuse the same handle with an incremented attempt counter.
///
/// # Acknowledgment
///
/// `ack` marks the message as processed so the transport stops
/// redelivering it. It must be idempotent: acknowledging twice, or from
/// multiple code paths within one dispatch cycle, is a no-op.
pub trait RawMessage: Send + Sync {
    /// Transport-assigned message id (diagnostics only, not routing)
    fn id(&self) -> u64;

    /// Value of a transport-level attribute, if present
    fn attribute(&self, key: &str) -> Option<String>;

    /// Opaque payload body
    fn payload(&self) -> Bytes;

    /// Mark the message as processed. Idempotent.
    fn ack(&self);

    /// Whether the message has been acknowledged
    fn is_acked(&self) -> bool;

    /// 1-based delivery attempt counter
    fn delivery_attempt(&self) -> u32;
}
