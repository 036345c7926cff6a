//! Subscriber Demo
//!
//! Demonstrates the full dispatch cycle over the in-memory transport:
//! immediate handlers, a deferred task on the queue backend, a flaky
//! handler that recovers through redelivery, and an unregistered event
//! that gets acknowledged and dropped. Dispatch outcomes are recorded
//! through the observability recorders and summarized at the end.
//!
//! Run with: cargo run --bin subscriber_demo

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use contracts::{CredentialsContext, DeliveryConfig, Subscription, TaskRef};
use dispatcher::{EventDispatcherBuilder, HandlerOptions, QueueTaskBackend};
use observability::{DispatchStatsAggregator, LogFormat, ObservabilityConfig};
use transport::MemoryTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Tracing only; set metrics_port to Some(9000) to scrape the
    // pubsub_dispatch_* counters with Prometheus
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Pretty,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    tracing::info!("Starting Subscriber Demo");

    // ==== Stage 1: Transport ====
    let transport = MemoryTransport::new(DeliveryConfig {
        ack_deadline: Duration::from_millis(150),
        max_deliveries: 3,
    });

    // ==== Stage 2: Deferred backend ====
    let backend = Arc::new(
        QueueTaskBackend::builder("invoice-worker")
            .task("send_invoice", |payload, event| {
                observability::record_task_submitted("send_invoice", &event);
                tracing::info!(event = %event, payload = %payload, "invoice task executed");
                Ok(())
            })
            .spawn(64),
    );

    // ==== Stage 3: Dispatcher with handlers ====
    let stats = Arc::new(Mutex::new(DispatchStatsAggregator::new()));

    let record_stats = stats.clone();
    let audit_stats = stats.clone();
    let flaky_attempts = Arc::new(AtomicU64::new(0));
    let dispatcher = Arc::new(
        EventDispatcherBuilder::new("orders", "billing", backend.clone())
            .register_handler(
                "order.created",
                "record_order",
                move |args| {
                    let started = Instant::now();
                    tracing::info!(data = %args.data, "order recorded");
                    let latency_ms = started.elapsed().as_secs_f64() * 1e3;
                    observability::record_event_dispatched("order.created", "record_order", false);
                    observability::record_dispatch_latency_ms(latency_ms);
                    record_stats
                        .lock()
                        .unwrap()
                        .observe_dispatched("order.created", latency_ms);
                    Ok(())
                },
                HandlerOptions::default(),
            )
            .register_handler(
                "order.updated",
                "audit_order",
                move |args| {
                    let started = Instant::now();
                    tracing::info!(
                        event = args.event_name.as_deref().unwrap_or("?"),
                        data = %args.data,
                        "order audited"
                    );
                    let latency_ms = started.elapsed().as_secs_f64() * 1e3;
                    observability::record_event_dispatched("order.updated", "audit_order", false);
                    observability::record_dispatch_latency_ms(latency_ms);
                    audit_stats
                        .lock()
                        .unwrap()
                        .observe_dispatched("order.updated", latency_ms);
                    Ok(())
                },
                HandlerOptions::with_event_name(),
            )
            .register_handler(
                "order.flagged",
                "review_order",
                move |args| {
                    // Fails on the first delivery; the transport
                    // redelivers and the retry succeeds
                    if flaky_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        observability::record_handler_failure("order.flagged", "review_order");
                        anyhow::bail!("reviewer pool exhausted")
                    }
                    tracing::info!(data = %args.data, "flagged order reviewed");
                    observability::record_event_dispatched("order.flagged", "review_order", false);
                    Ok(())
                },
                HandlerOptions::default(),
            )
            .register_task(
                "order.completed",
                TaskRef::new("send_invoice"),
                HandlerOptions::default(),
            )
            .build(),
    );

    // ==== Stage 4: Subscribe and publish ====
    let subscription = dispatcher.start(&transport, &CredentialsContext::default())?;

    transport.publish("orders", "order.created", r#"{"id":1}"#);
    transport.publish("orders", "order.updated", r#"{"id":1,"total":99}"#);
    transport.publish("orders", "order.completed", r#"{"id":1}"#);
    transport.publish("orders", "order.flagged", r#"{"id":1,"reason":"amount"}"#);
    // No handler registered; acknowledged and dropped
    transport.publish("orders", "order.archived", r#"{"id":1}"#);

    // Long enough for the flaky handler's redelivery to come around
    tokio::time::sleep(Duration::from_millis(500)).await;

    // ==== Stage 5: Export counters and summarize ====
    let dispatch = dispatcher.metrics().snapshot();
    let delivery = transport.metrics().snapshot();

    for _ in 0..dispatch.ignored {
        observability::record_event_ignored("order.archived");
    }
    for n in 0..delivery.redelivered {
        observability::record_message_redelivered("orders", n as u32 + 2);
    }

    println!("{}", stats.lock().unwrap().summary());

    tracing::info!(
        dispatched = dispatch.dispatched,
        ignored = dispatch.ignored,
        handler_failures = dispatch.handler_failures,
        redelivered = delivery.redelivered,
        tasks_executed = backend.executed_count(),
        "demo finished"
    );

    subscription.stop();
    Ok(())
}
