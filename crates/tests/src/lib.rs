//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot checks
//! - End-to-end dispatch over the in-memory transport (no real broker)
//! - Blueprint-to-dispatcher wiring

#[cfg(test)]
mod contract_tests {
    use contracts::{DeliveryConfig, EVENT_ATTRIBUTE};
    use std::time::Duration;

    #[test]
    fn test_event_attribute_name_is_stable() {
        // The publisher side writes this attribute; renaming it is a
        // wire-format break.
        assert_eq!(EVENT_ATTRIBUTE, "event");
    }

    #[test]
    fn test_delivery_defaults() {
        let config = DeliveryConfig::default();
        assert_eq!(config.ack_deadline, Duration::from_secs(10));
        assert_eq!(config.max_deliveries, 5);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{CredentialsContext, DeliveryConfig, Subscription, TaskRef};
    use dispatcher::{
        EventDispatcherBuilder, HandlerArgs, HandlerOptions, LogTaskBackend, QueueTaskBackend,
    };
    use tokio::time::sleep;

    fn fast_config() -> DeliveryConfig {
        DeliveryConfig {
            ack_deadline: Duration::from_millis(30),
            max_deliveries: 3,
        }
    }

    fn transport() -> transport::MemoryTransport {
        transport::MemoryTransport::new(fast_config())
    }

    /// End-to-end: publish -> MemoryTransport -> EventDispatcher -> handler
    #[tokio::test]
    async fn test_e2e_immediate_handler() {
        let transport = transport();
        let seen = Arc::new(Mutex::new(Vec::<HandlerArgs>::new()));

        let seen_inner = seen.clone();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.created",
                "send_invoice",
                move |args| {
                    seen_inner.lock().unwrap().push(args);
                    Ok(())
                },
                HandlerOptions::default(),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", r#"{"id":42}"#);
        sleep(Duration::from_millis(100)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data, r#"{"id":42}"#);
        assert_eq!(seen[0].event_name, None);
        // Acked on first delivery, so no redelivery happened
        assert_eq!(transport.metrics().snapshot().redelivered, 0);
        assert_eq!(dispatcher.metrics().snapshot().dispatched, 1);
    }

    /// Unregistered events are acknowledged and dropped, never retried
    #[tokio::test]
    async fn test_e2e_unregistered_event_is_ignored_once() {
        let transport = transport();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.deleted", "{}");
        sleep(Duration::from_millis(150)).await;

        let snapshot = transport.metrics().snapshot();
        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.redelivered, 0);
        assert_eq!(dispatcher.metrics().snapshot().ignored, 1);
    }

    /// With late acking, a failing handler sees the message again until
    /// it succeeds
    #[tokio::test]
    async fn test_e2e_late_ack_retries_until_success() {
        let transport = transport();
        let attempts = Arc::new(AtomicU64::new(0));

        let attempts_inner = attempts.clone();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.created",
                "send_invoice",
                move |_| {
                    // Fail twice, then succeed
                    if attempts_inner.fetch_add(1, Ordering::SeqCst) < 2 {
                        anyhow::bail!("smtp down")
                    }
                    Ok(())
                },
                HandlerOptions::default(),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", "{}");
        sleep(Duration::from_millis(250)).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let snapshot = transport.metrics().snapshot();
        assert_eq!(snapshot.redelivered, 2);
        assert_eq!(snapshot.expired, 0);
        assert_eq!(dispatcher.metrics().snapshot().handler_failures, 2);
        assert_eq!(dispatcher.metrics().snapshot().dispatched, 1);
    }

    /// With early acking, a handler failure loses the delivery instead
    /// of retrying it
    #[tokio::test]
    async fn test_e2e_early_ack_failure_is_not_redelivered() {
        let transport = transport();
        let attempts = Arc::new(AtomicU64::new(0));

        let attempts_inner = attempts.clone();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.created",
                "send_invoice",
                move |_| {
                    attempts_inner.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("smtp down")
                },
                HandlerOptions::ack_early(),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", "{}");
        sleep(Duration::from_millis(150)).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(transport.metrics().snapshot().redelivered, 0);
    }

    /// Opt-in event-name forwarding shapes the handler arguments
    #[tokio::test]
    async fn test_e2e_send_event_forwards_event_name() {
        let transport = transport();
        let seen = Arc::new(Mutex::new(Vec::<HandlerArgs>::new()));

        let seen_inner = seen.clone();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.updated",
                "audit",
                move |args| {
                    seen_inner.lock().unwrap().push(args);
                    Ok(())
                },
                HandlerOptions::with_event_name(),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.updated", "payload");
        sleep(Duration::from_millis(100)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].event_name.as_deref(), Some("order.updated"));
    }

    /// Deferred bindings submit (payload, event_name) to the backend and
    /// the message acks after a successful submission
    #[tokio::test]
    async fn test_e2e_deferred_task_executes_on_worker() {
        let transport = transport();
        let executed = Arc::new(Mutex::new(Vec::new()));

        let executed_inner = executed.clone();
        let backend = Arc::new(
            QueueTaskBackend::builder("worker")
                .task("send_invoice", move |payload, event| {
                    executed_inner.lock().unwrap().push((payload, event));
                    Ok(())
                })
                .spawn(16),
        );

        let dispatcher = Arc::new(
            EventDispatcherBuilder::new("orders", "billing", backend.clone())
                .register_task(
                    "order.created",
                    TaskRef::new("send_invoice"),
                    HandlerOptions::default(),
                )
                .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", r#"{"id":7}"#);
        sleep(Duration::from_millis(100)).await;

        assert_eq!(backend.executed_count(), 1);
        assert_eq!(
            executed.lock().unwrap().as_slice(),
            &[(r#"{"id":7}"#.to_string(), "order.created".to_string())]
        );
        assert_eq!(transport.metrics().snapshot().redelivered, 0);
    }

    /// A rejected submission leaves the message on the redelivery loop;
    /// once the backend recovers, the retry succeeds
    #[tokio::test]
    async fn test_e2e_submission_failure_retried_by_transport() {
        let transport = transport();
        let backend = Arc::new(LogTaskBackend::new("tasks"));
        backend.fail_submissions(true);

        let dispatcher = Arc::new(
            EventDispatcherBuilder::new("orders", "billing", backend.clone())
                .register_task(
                    "order.created",
                    TaskRef::new("send_invoice"),
                    HandlerOptions::default(),
                )
                .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", "{}");
        sleep(Duration::from_millis(50)).await;
        backend.fail_submissions(false);
        sleep(Duration::from_millis(150)).await;

        assert_eq!(backend.submissions().len(), 1);
        let snapshot = transport.metrics().snapshot();
        assert!(snapshot.redelivered >= 1);
        assert_eq!(snapshot.expired, 0);
    }

    /// Messages without an event attribute are never acknowledged and
    /// expire after max deliveries
    #[tokio::test]
    async fn test_e2e_malformed_message_expires() {
        let transport = transport();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish_with_attributes("orders", Default::default(), "{}");
        sleep(Duration::from_millis(250)).await;

        let snapshot = transport.metrics().snapshot();
        assert_eq!(snapshot.delivered, 3);
        assert_eq!(snapshot.expired, 1);
        assert_eq!(dispatcher.metrics().snapshot().malformed, 3);
    }

    /// A stopped subscription halts delivery
    #[tokio::test]
    async fn test_e2e_stop_subscription() {
        let transport = transport();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.created",
                "send_invoice",
                |_| Ok(()),
                HandlerOptions::default(),
            )
            .build(),
        );

        let subscription = dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();
        subscription.stop();

        transport.publish("orders", "order.created", "{}");
        sleep(Duration::from_millis(80)).await;

        assert_eq!(dispatcher.metrics().snapshot().dispatched, 0);
    }
}

#[cfg(test)]
mod stats_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{CredentialsContext, DeliveryConfig};
    use dispatcher::{EventDispatcherBuilder, HandlerOptions, LogTaskBackend};
    use observability::DispatchStatsAggregator;
    use tokio::time::sleep;

    /// Aggregated stats fed from a live dispatch run
    #[tokio::test]
    async fn test_aggregator_over_live_dispatch() {
        let transport = transport::MemoryTransport::new(DeliveryConfig {
            ack_deadline: Duration::from_millis(30),
            max_deliveries: 3,
        });
        let stats = Arc::new(Mutex::new(DispatchStatsAggregator::new()));

        let stats_inner = stats.clone();
        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                "orders",
                "billing",
                Arc::new(LogTaskBackend::new("tasks")),
            )
            .register_handler(
                "order.created",
                "send_invoice",
                move |_| {
                    stats_inner
                        .lock()
                        .unwrap()
                        .observe_dispatched("order.created", 0.5);
                    Ok(())
                },
                HandlerOptions::default(),
            )
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", "{}");
        transport.publish("orders", "order.created", "{}");
        sleep(Duration::from_millis(100)).await;

        let summary = stats.lock().unwrap().summary();
        assert_eq!(summary.total_dispatched, 2);
        assert_eq!(summary.event_counts.get("order.created"), Some(&2));
        assert_eq!(summary.latency_ms.count, 2);
    }
}

#[cfg(test)]
mod blueprint_tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::CredentialsContext;
    use dispatcher::{EventDispatcherBuilder, HandlerFn, LogTaskBackend};
    use tokio::time::sleep;

    const BLUEPRINT: &str = r#"
[subscriber]
topic = "orders"
name = "billing"

[delivery]
ack_deadline_ms = 30
max_deliveries = 3

[[events]]
event = "order.created"
handler = "send_invoice"

[[events]]
event = "order.shipped"
handler = "notify_carrier"
kind = "task"
"#;

    /// Blueprint file -> validated config -> running dispatcher
    #[tokio::test]
    async fn test_blueprint_drives_dispatcher() {
        let blueprint = ConfigLoader::load_from_str(BLUEPRINT, ConfigFormat::Toml).unwrap();
        let transport = transport::MemoryTransport::new(blueprint.to_delivery_config());

        let invoked = Arc::new(AtomicU64::new(0));
        let invoked_inner = invoked.clone();
        let backend = Arc::new(LogTaskBackend::new("tasks"));

        let dispatcher = Arc::new(
            EventDispatcherBuilder::new(
                &blueprint.subscriber.topic,
                &blueprint.subscriber.name,
                backend.clone(),
            )
            .apply_bindings(&blueprint.events, |name| match name {
                "send_invoice" => {
                    let invoked = invoked_inner.clone();
                    Some(Arc::new(move |_| {
                        invoked.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }) as HandlerFn)
                }
                _ => None,
            })
            .unwrap()
            .build(),
        );

        dispatcher
            .start(&transport, &CredentialsContext::default())
            .unwrap();

        transport.publish("orders", "order.created", "{}");
        transport.publish("orders", "order.shipped", "{}");
        sleep(Duration::from_millis(100)).await;

        assert_eq!(invoked.load(Ordering::SeqCst), 1);
        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].task, "notify_carrier");
        assert_eq!(submissions[0].event, "order.shipped");
    }
}
