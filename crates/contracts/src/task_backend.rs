//! TaskBackend trait - deferred execution interface
//!
//! Defines the abstract interface for out-of-process task backends.

use crate::ContractError;

/// Reference to a task known to the deferred backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    /// Task name the backend resolves to an executable unit of work
    pub name: String,
}

impl TaskRef {
    /// Create a task reference by name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Deferred task execution backend
///
/// All task backend implementations must implement this trait.
pub trait TaskBackend: Send + Sync {
    /// Backend name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Hand off a task for asynchronous execution
    ///
    /// Carries `(payload, event_name)` as positional task arguments.
    /// Fire-and-forget: blocks only long enough to enqueue the request,
    /// never until the task executes.
    ///
    /// # Errors
    /// Returns `TaskSubmission` when the backend rejects or cannot
    /// accept the task
    fn submit(&self, task: &TaskRef, payload: &str, event_name: &str) -> Result<(), ContractError>;
}
