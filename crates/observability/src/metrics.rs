//! Dispatch metrics recording
//!
//! Prometheus-facing recorders for the dispatch cycle, plus an in-memory
//! aggregator for summaries at shutdown.

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// Record one completed dispatch
///
/// Call once per message handled to completion (handler ran or task
/// submitted).
pub fn record_event_dispatched(event: &str, handler: &str, ack_early: bool) {
    let ack_path = if ack_early { "early" } else { "final" };
    counter!(
        "pubsub_dispatch_events_total",
        "event" => event.to_string(),
        "handler" => handler.to_string(),
        "ack_path" => ack_path.to_string()
    )
    .increment(1);
}

/// Record a message dropped with no registered handler
pub fn record_event_ignored(event: &str) {
    counter!(
        "pubsub_dispatch_ignored_total",
        "event" => event.to_string()
    )
    .increment(1);
}

/// Record a message rejected for a missing event attribute
pub fn record_malformed_message() {
    counter!("pubsub_dispatch_malformed_total").increment(1);
}

/// Record an immediate handler failure
pub fn record_handler_failure(event: &str, handler: &str) {
    counter!(
        "pubsub_dispatch_handler_failures_total",
        "event" => event.to_string(),
        "handler" => handler.to_string()
    )
    .increment(1);
}

/// Record a deferred task submission
pub fn record_task_submitted(task: &str, event: &str) {
    counter!(
        "pubsub_dispatch_tasks_submitted_total",
        "task" => task.to_string(),
        "event" => event.to_string()
    )
    .increment(1);
}

/// Record a rejected task submission
pub fn record_task_submission_failure(task: &str) {
    counter!(
        "pubsub_dispatch_task_submission_failures_total",
        "task" => task.to_string()
    )
    .increment(1);
}

/// Record a transport redelivery
pub fn record_message_redelivered(topic: &str, attempt: u32) {
    counter!(
        "pubsub_dispatch_redeliveries_total",
        "topic" => topic.to_string()
    )
    .increment(1);
    gauge!(
        "pubsub_dispatch_last_redelivery_attempt",
        "topic" => topic.to_string()
    )
    .set(attempt as f64);
}

/// Record end-to-end dispatch latency for one message
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("pubsub_dispatch_latency_ms").record(latency_ms);
}

/// Dispatch statistics aggregator
///
/// Aggregates dispatch outcomes in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// Messages handled to completion
    pub total_dispatched: u64,

    /// Messages dropped with no registered handler
    pub total_ignored: u64,

    /// Messages rejected for a missing event attribute
    pub total_malformed: u64,

    /// Immediate handler failures
    pub total_handler_failures: u64,

    /// Rejected task submissions
    pub total_submission_failures: u64,

    /// Latency statistics (milliseconds)
    pub latency_stats: RunningStats,

    /// Dispatch counts per event name
    pub event_counts: HashMap<String, u64>,
}

impl DispatchStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed dispatch
    pub fn observe_dispatched(&mut self, event: &str, latency_ms: f64) {
        self.total_dispatched += 1;
        self.latency_stats.push(latency_ms);
        *self.event_counts.entry(event.to_string()).or_insert(0) += 1;
    }

    /// Record an ignored message
    pub fn observe_ignored(&mut self) {
        self.total_ignored += 1;
    }

    /// Record a malformed message
    pub fn observe_malformed(&mut self) {
        self.total_malformed += 1;
    }

    /// Record an immediate handler failure
    pub fn observe_handler_failure(&mut self) {
        self.total_handler_failures += 1;
    }

    /// Record a rejected task submission
    pub fn observe_submission_failure(&mut self) {
        self.total_submission_failures += 1;
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        let total_seen = self.total_dispatched + self.total_ignored + self.total_malformed;
        MetricsSummary {
            total_dispatched: self.total_dispatched,
            total_ignored: self.total_ignored,
            total_malformed: self.total_malformed,
            total_handler_failures: self.total_handler_failures,
            total_submission_failures: self.total_submission_failures,
            ignore_rate: if total_seen > 0 {
                self.total_ignored as f64 / total_seen as f64 * 100.0
            } else {
                0.0
            },
            failure_rate: if self.total_dispatched > 0 {
                (self.total_handler_failures + self.total_submission_failures) as f64
                    / self.total_dispatched as f64
                    * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            event_counts: self.event_counts.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_dispatched: u64,
    pub total_ignored: u64,
    pub total_malformed: u64,
    pub total_handler_failures: u64,
    pub total_submission_failures: u64,
    pub ignore_rate: f64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub event_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Dispatched: {}", self.total_dispatched)?;
        writeln!(
            f,
            "Ignored: {} ({:.2}%)",
            self.total_ignored, self.ignore_rate
        )?;
        writeln!(f, "Malformed: {}", self.total_malformed)?;
        writeln!(
            f,
            "Failures: {} handler, {} submission ({:.2}%)",
            self.total_handler_failures, self.total_submission_failures, self.failure_rate
        )?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.event_counts.is_empty() {
            writeln!(f, "Events:")?;
            for (event, count) in &self.event_counts {
                writeln!(f, "  {}: {}", event, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_run_without_installed_exporter() {
        // The metrics macros no-op when no recorder is installed; every
        // recorder must still accept its labels without panicking
        record_event_dispatched("order.created", "send_invoice", true);
        record_event_dispatched("order.created", "send_invoice", false);
        record_event_ignored("order.archived");
        record_malformed_message();
        record_handler_failure("order.created", "send_invoice");
        record_task_submitted("send_invoice", "order.created");
        record_task_submission_failure("send_invoice");
        record_message_redelivered("orders", 2);
        record_dispatch_latency_ms(1.25);
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_observations() {
        let mut aggregator = DispatchStatsAggregator::new();

        aggregator.observe_dispatched("order.created", 1.5);
        aggregator.observe_dispatched("order.created", 2.5);
        aggregator.observe_ignored();
        aggregator.observe_handler_failure();

        assert_eq!(aggregator.total_dispatched, 2);
        assert_eq!(aggregator.total_ignored, 1);
        assert_eq!(aggregator.total_handler_failures, 1);
        assert_eq!(aggregator.event_counts.get("order.created"), Some(&2));

        let summary = aggregator.summary();
        assert!((summary.latency_ms.mean - 2.0).abs() < 1e-10);
        assert!((summary.failure_rate - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DispatchStatsAggregator::new();
        aggregator.observe_dispatched("order.created", 1.0);
        aggregator.observe_ignored();

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Dispatched: 1"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("order.created: 1"));
    }

    #[test]
    fn test_reset() {
        let mut aggregator = DispatchStatsAggregator::new();
        aggregator.observe_dispatched("a", 1.0);
        aggregator.reset();
        assert_eq!(aggregator.total_dispatched, 0);
        assert!(aggregator.event_counts.is_empty());
    }
}
