//! # Dispatcher
//!
//! Event dispatch module.
//!
//! Responsibilities:
//! - Map event names to registered handlers (last-write-wins registry)
//! - Adapt raw transport messages, extracting event name and payload
//! - Run the per-message dispatch cycle with early/late acknowledgment
//! - Hand deferred tasks to a `TaskBackend`
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use dispatcher::{EventDispatcherBuilder, HandlerOptions, LogTaskBackend};
//!
//! let backend = Arc::new(LogTaskBackend::new("tasks"));
//! let dispatcher = Arc::new(
//!     EventDispatcherBuilder::new("orders", "billing", backend)
//!         .register_handler(
//!             "order.created",
//!             "send_invoice",
//!             |args| { println!("{}", args.data); Ok(()) },
//!             HandlerOptions::default(),
//!         )
//!         .build(),
//! );
//!
//! let subscription = dispatcher.start(&transport, &credentials)?;
//! ```

pub mod backends;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod metrics;
pub mod registry;

pub use backends::{
    LogTaskBackend, QueueTaskBackend, QueueTaskBackendBuilder, TaskFn, TaskSubmissionRecord,
};
pub use contracts::{TaskBackend, TaskRef};
pub use dispatcher::{DispatchOutcome, EventDispatcher, EventDispatcherBuilder};
pub use error::DispatchError;
pub use message::{AckPath, InboundMessage};
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use registry::{
    HandlerArgs, HandlerFn, HandlerOptions, HandlerRegistry, HandlerTarget, RegistryEntry,
};
