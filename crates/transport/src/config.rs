//! Delivery metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Transport delivery metrics
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Total messages published
    pub published: AtomicU64,

    /// Total delivery attempts (first deliveries and redeliveries)
    pub delivered: AtomicU64,

    /// Redelivery attempts only
    pub redelivered: AtomicU64,

    /// Callback invocations that returned an error
    pub dispatch_errors: AtomicU64,

    /// Messages dropped unacknowledged after max deliveries
    pub expired: AtomicU64,
}

impl TransportMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record message published
    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Record delivery attempt
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record redelivery attempt
    pub fn record_redelivered(&self) {
        self.redelivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record callback error
    pub fn record_dispatch_error(&self) {
        self.dispatch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record message dropped after max deliveries
    pub fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            published: self.published.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            redelivered: self.redelivered.load(Ordering::Relaxed),
            dispatch_errors: self.dispatch_errors.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSnapshot {
    /// Total messages published
    pub published: u64,

    /// Total delivery attempts
    pub delivered: u64,

    /// Redelivery attempts only
    pub redelivered: u64,

    /// Callback invocations that returned an error
    pub dispatch_errors: u64,

    /// Messages dropped unacknowledged after max deliveries
    pub expired: u64,
}
