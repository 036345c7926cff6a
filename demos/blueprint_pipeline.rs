//! Blueprint Pipeline Example
//!
//! Loads a subscriber blueprint (from a file path argument or an inline
//! default), resolves handler names to code, and runs the dispatcher
//! against the in-memory transport.
//!
//! Run with: cargo run --bin blueprint_pipeline [config.toml]

use std::sync::Arc;
use std::time::Duration;

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{CredentialsContext, SubscriberBlueprint, Subscription};
use dispatcher::{EventDispatcherBuilder, HandlerFn, LogTaskBackend};
use observability::{LogFormat, ObservabilityConfig};
use transport::MemoryTransport;

const DEFAULT_BLUEPRINT: &str = r#"
[subscriber]
topic = "orders"
name = "billing"

[delivery]
ack_deadline_ms = 200
max_deliveries = 3

[[events]]
event = "order.created"
handler = "send_invoice"
send_event = true

[[events]]
event = "order.shipped"
handler = "notify_carrier"
kind = "task"
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    // ==== Stage 1: Load and validate the blueprint ====
    let blueprint: SubscriberBlueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        ConfigLoader::load_from_str(DEFAULT_BLUEPRINT, ConfigFormat::Toml)?
    };

    tracing::info!(
        topic = %blueprint.subscriber.topic,
        name = %blueprint.subscriber.name,
        events = blueprint.events.len(),
        "Blueprint loaded"
    );

    // ==== Stage 2: Transport from blueprint delivery policy ====
    let transport = MemoryTransport::new(blueprint.to_delivery_config());

    // ==== Stage 3: Resolve bindings into a dispatcher ====
    let backend = Arc::new(LogTaskBackend::new("task-log"));
    let dispatcher = Arc::new(
        EventDispatcherBuilder::new(
            &blueprint.subscriber.topic,
            &blueprint.subscriber.name,
            backend.clone(),
        )
        .apply_bindings(&blueprint.events, resolve_handler)?
        .build(),
    );

    // ==== Stage 4: Run ====
    let subscription = dispatcher.start(&transport, &CredentialsContext::default())?;

    transport.publish(
        &blueprint.subscriber.topic,
        "order.created",
        r#"{"id":7,"total":120}"#,
    );
    transport.publish(
        &blueprint.subscriber.topic,
        "order.shipped",
        r#"{"id":7,"carrier":"dhl"}"#,
    );

    tokio::time::sleep(Duration::from_millis(300)).await;

    for submission in backend.submissions() {
        tracing::info!(
            task = %submission.task,
            event = %submission.event,
            "deferred submission recorded"
        );
    }

    subscription.stop();
    Ok(())
}

/// Handler table: maps blueprint handler names to code
fn resolve_handler(name: &str) -> Option<HandlerFn> {
    match name {
        "send_invoice" => Some(Arc::new(|args| {
            tracing::info!(
                event = args.event_name.as_deref().unwrap_or("?"),
                data = %args.data,
                "invoice sent"
            );
            Ok(())
        })),
        _ => None,
    }
}
