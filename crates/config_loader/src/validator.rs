//! Configuration validation module
//!
//! Validation rules:
//! - subscriber.topic and subscriber.name non-empty
//! - delivery.ack_deadline_ms > 0
//! - delivery.max_deliveries >= 1
//! - event bindings: non-empty event/handler names
//! - event bindings: no duplicate event names

use std::collections::HashSet;

use contracts::{ContractError, SubscriberBlueprint};

/// Validate a SubscriberBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SubscriberBlueprint) -> Result<(), ContractError> {
    validate_subscriber(blueprint)?;
    validate_delivery(blueprint)?;
    validate_events(blueprint)?;
    Ok(())
}

/// Validate subscriber identity fields
fn validate_subscriber(blueprint: &SubscriberBlueprint) -> Result<(), ContractError> {
    if blueprint.subscriber.topic.is_empty() {
        return Err(ContractError::config_validation(
            "subscriber.topic",
            "topic cannot be empty",
        ));
    }
    if blueprint.subscriber.name.is_empty() {
        return Err(ContractError::config_validation(
            "subscriber.name",
            "subscriber name cannot be empty",
        ));
    }
    Ok(())
}

/// Validate delivery policy ranges
fn validate_delivery(blueprint: &SubscriberBlueprint) -> Result<(), ContractError> {
    let delivery = &blueprint.delivery;

    if delivery.ack_deadline_ms == 0 {
        return Err(ContractError::config_validation(
            "delivery.ack_deadline_ms",
            "ack_deadline_ms must be > 0",
        ));
    }
    if delivery.max_deliveries == 0 {
        return Err(ContractError::config_validation(
            "delivery.max_deliveries",
            "max_deliveries must be >= 1",
        ));
    }
    Ok(())
}

/// Validate event bindings
///
/// Duplicate event names are rejected here even though the runtime
/// registry is last-write-wins: a config file binding one event twice is
/// an authoring mistake, not an intentional overwrite.
fn validate_events(blueprint: &SubscriberBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, binding) in blueprint.events.iter().enumerate() {
        if binding.event.is_empty() {
            return Err(ContractError::config_validation(
                format!("events[{idx}].event"),
                "event name cannot be empty",
            ));
        }
        if binding.handler.is_empty() {
            return Err(ContractError::config_validation(
                format!("events[{idx}].handler"),
                "handler name cannot be empty",
            ));
        }
        if !seen.insert(&binding.event) {
            return Err(ContractError::config_validation(
                format!("events[event={}]", binding.event),
                "duplicate event binding",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BindingKind, ConfigVersion, DeliverySettings, EventBinding, SubscriberSettings,
    };

    fn minimal_blueprint() -> SubscriberBlueprint {
        SubscriberBlueprint {
            version: ConfigVersion::V1,
            subscriber: SubscriberSettings {
                topic: "orders".into(),
                name: "billing".into(),
                project_id: None,
            },
            delivery: DeliverySettings::default(),
            events: vec![EventBinding {
                event: "order.created".into(),
                handler: "send_invoice".into(),
                kind: BindingKind::Immediate,
                ack_late: true,
                send_event: false,
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_topic() {
        let mut bp = minimal_blueprint();
        bp.subscriber.topic = String::new();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("topic cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_empty_name() {
        let mut bp = minimal_blueprint();
        bp.subscriber.name = String::new();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("subscriber name"), "got: {err}");
    }

    #[test]
    fn test_zero_ack_deadline() {
        let mut bp = minimal_blueprint();
        bp.delivery.ack_deadline_ms = 0;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("ack_deadline_ms must be > 0"), "got: {err}");
    }

    #[test]
    fn test_zero_max_deliveries() {
        let mut bp = minimal_blueprint();
        bp.delivery.max_deliveries = 0;
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("max_deliveries must be >= 1"), "got: {err}");
    }

    #[test]
    fn test_duplicate_event_binding() {
        let mut bp = minimal_blueprint();
        bp.events.push(bp.events[0].clone());
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate event binding"), "got: {err}");
    }

    #[test]
    fn test_empty_handler_name() {
        let mut bp = minimal_blueprint();
        bp.events[0].handler = String::new();
        let result = validate(&bp);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("handler name cannot be empty"), "got: {err}");
    }
}
