//! Log task backend
//!
//! Records every submission instead of executing anything. Stands in for
//! a broker-backed backend in demos, and gives tests a handle to assert
//! exactly what was submitted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use contracts::{ContractError, TaskBackend, TaskRef};
use tracing::info;

/// One recorded submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubmissionRecord {
    /// Task name
    pub task: String,

    /// Payload positional argument
    pub payload: String,

    /// Event name positional argument
    pub event: String,
}

/// Backend that logs and records task submissions
pub struct LogTaskBackend {
    name: String,
    submissions: Mutex<Vec<TaskSubmissionRecord>>,
    fail_submissions: AtomicBool,
}

impl LogTaskBackend {
    /// Create a new recording backend
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            submissions: Mutex::new(Vec::new()),
            fail_submissions: AtomicBool::new(false),
        }
    }

    /// Make subsequent submissions fail, exercising the rejection path
    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Copy of everything submitted so far, in order
    pub fn submissions(&self) -> Vec<TaskSubmissionRecord> {
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TaskBackend for LogTaskBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, task: &TaskRef, payload: &str, event_name: &str) -> Result<(), ContractError> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ContractError::task_submission(
                &task.name,
                "backend unavailable",
            ));
        }

        info!(
            backend = %self.name,
            task = %task.name,
            event = %event_name,
            "task submission recorded"
        );

        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(TaskSubmissionRecord {
                task: task.name.clone(),
                payload: payload.to_string(),
                event: event_name.to_string(),
            });

        Ok(())
    }
}
