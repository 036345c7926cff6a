//! Runtime delivery configuration shared with the transport

use std::time::Duration;

/// Redelivery behavior for unacknowledged messages
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// How long the transport waits for an ack before redelivering
    pub ack_deadline: Duration,

    /// Total delivery attempts before a message is dropped
    pub max_deliveries: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ack_deadline: Duration::from_secs(10),
            max_deliveries: 5,
        }
    }
}
