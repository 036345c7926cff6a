//! # Transport
//!
//! Delivery transport module.
//!
//! Responsibilities:
//! - Implement the `PullTransport` contract for local development and tests
//! - At-least-once delivery: redeliver unacknowledged messages after the
//!   ack deadline, up to the configured attempt limit
//! - Delivery metrics
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{CredentialsContext, DeliveryConfig, PullTransport};
//! use transport::MemoryTransport;
//!
//! let transport = MemoryTransport::new(DeliveryConfig::default());
//! let subscription = transport.subscribe(
//!     "orders", "billing", callback, &CredentialsContext::default(),
//! )?;
//!
//! transport.publish("orders", "order.created", r#"{"id":42}"#);
//! // ... later
//! subscription.stop();
//! ```

mod config;
mod memory;

pub use config::{TransportMetrics, TransportSnapshot};
pub use contracts::DeliveryConfig;
pub use memory::{MemoryMessage, MemoryTransport};
