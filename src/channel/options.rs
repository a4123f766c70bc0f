use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bound on every blocking wait a channel performs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Quality of service requested from the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryClass {
    AtMostOnce,
    #[default]
    AtLeastOnce,
}

/// Per-channel settings, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    pub delivery_class: DeliveryClass,
    pub timeout: Duration,
}

impl ChannelOptions {
    pub fn new(delivery_class: DeliveryClass, timeout: Duration) -> Self {
        Self {
            delivery_class,
            timeout,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_delivery_class(self, delivery_class: DeliveryClass) -> Self {
        Self {
            delivery_class,
            ..self
        }
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::new(DeliveryClass::default(), DEFAULT_TIMEOUT)
    }
}
