//! Dispatch metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-dispatcher counters
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages handled to completion (handler ran or task submitted)
    pub dispatched: AtomicU64,

    /// Messages acknowledged and dropped with no registered handler
    pub ignored: AtomicU64,

    /// Messages rejected for a missing event attribute
    pub malformed: AtomicU64,

    /// Immediate handler invocations that returned an error
    pub handler_failures: AtomicU64,

    /// Deferred submissions the backend rejected
    pub submission_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed dispatch
    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ignored message
    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed message
    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an immediate handler failure
    pub fn record_handler_failure(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected task submission
    pub fn record_submission_failure(&self) {
        self.submission_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            submission_failures: self.submission_failures.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    /// Messages handled to completion
    pub dispatched: u64,

    /// Messages dropped with no registered handler
    pub ignored: u64,

    /// Messages rejected for a missing event attribute
    pub malformed: u64,

    /// Immediate handler failures
    pub handler_failures: u64,

    /// Rejected task submissions
    pub submission_failures: u64,
}
