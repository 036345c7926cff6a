//! Queue task backend
//!
//! Bounded in-process queue drained by a spawned worker task. `submit`
//! only enqueues; execution happens on the worker, so the dispatch cycle
//! never waits for a task to run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{ContractError, TaskBackend, TaskRef};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Task function executed by the worker, called with `(payload, event_name)`
pub type TaskFn = Arc<dyn Fn(String, String) -> anyhow::Result<()> + Send + Sync>;

struct TaskRequest {
    task: String,
    payload: String,
    event: String,
}

/// Builder registering task functions by name
pub struct QueueTaskBackendBuilder {
    name: String,
    tasks: HashMap<String, TaskFn>,
}

impl QueueTaskBackendBuilder {
    /// Start building a backend named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: HashMap::new(),
        }
    }

    /// Register a task function under `task_name`
    pub fn task<F>(mut self, task_name: impl Into<String>, task: F) -> Self
    where
        F: Fn(String, String) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tasks.insert(task_name.into(), Arc::new(task));
        self
    }

    /// Spawn the worker and return the running backend
    ///
    /// `queue_capacity` bounds how many submissions can wait for the
    /// worker. A full queue rejects further submissions, leaving those
    /// messages to transport redelivery.
    pub fn spawn(self, queue_capacity: usize) -> QueueTaskBackend {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let executed = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let worker_handle = tokio::spawn(task_worker(
            self.name.clone(),
            rx,
            self.tasks,
            executed.clone(),
            failed.clone(),
        ));

        QueueTaskBackend {
            name: self.name,
            tx,
            executed,
            failed,
            worker_handle,
        }
    }
}

/// In-process deferred backend
pub struct QueueTaskBackend {
    name: String,
    tx: mpsc::Sender<TaskRequest>,
    executed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    worker_handle: JoinHandle<()>,
}

impl QueueTaskBackend {
    /// Start a builder for a backend named `name`
    pub fn builder(name: impl Into<String>) -> QueueTaskBackendBuilder {
        QueueTaskBackendBuilder::new(name)
    }

    /// Tasks executed successfully
    pub fn executed_count(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Tasks that failed or resolved to no registered function
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Graceful shutdown: stop accepting submissions, drain the queue,
    /// await the worker
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(backend = %self.name, error = ?e, "task worker panicked");
        }
        debug!(backend = %self.name, "queue backend shutdown complete");
    }
}

impl TaskBackend for QueueTaskBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, task: &TaskRef, payload: &str, event_name: &str) -> Result<(), ContractError> {
        let request = TaskRequest {
            task: task.name.clone(),
            payload: payload.to_string(),
            event: event_name.to_string(),
        };

        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                ContractError::task_submission(&task.name, "queue full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                ContractError::task_submission(&task.name, "worker closed")
            }
        })
    }
}

async fn task_worker(
    name: String,
    mut rx: mpsc::Receiver<TaskRequest>,
    tasks: HashMap<String, TaskFn>,
    executed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
) {
    debug!(backend = %name, tasks = tasks.len(), "task worker started");

    while let Some(request) = rx.recv().await {
        match tasks.get(&request.task) {
            Some(task) => match task(request.payload, request.event) {
                Ok(()) => {
                    executed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    // Keep draining; one failing task must not stall the queue
                    failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        backend = %name,
                        task = %request.task,
                        error = %e,
                        "task execution failed"
                    );
                }
            },
            None => {
                failed.fetch_add(1, Ordering::Relaxed);
                error!(backend = %name, task = %request.task, "unknown task name");
            }
        }
    }

    debug!(backend = %name, "task worker stopped");
}
