//! Deferred task backends
//!
//! Implementations of the `TaskBackend` contract:
//! - `QueueTaskBackend`: in-process queue drained by a worker task
//! - `LogTaskBackend`: records submissions, for demos and tests

mod log;
mod queue;

pub use log::{LogTaskBackend, TaskSubmissionRecord};
pub use queue::{QueueTaskBackend, QueueTaskBackendBuilder, TaskFn};
