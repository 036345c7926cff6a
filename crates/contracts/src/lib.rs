//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - The transport owns delivery and guarantees at-least-once semantics:
//!   an unacknowledged message is redelivered after the ack deadline
//! - Event names are case-sensitive strings carried in the `event` attribute

mod blueprint;
mod delivery;
mod error;
mod message;
mod task_backend;
mod transport;

pub use blueprint::*;
pub use delivery::DeliveryConfig;
pub use error::*;
pub use message::{RawMessage, EVENT_ATTRIBUTE};
pub use task_backend::{TaskBackend, TaskRef};
pub use transport::{CredentialsContext, MessageCallback, PullTransport, Subscription};
