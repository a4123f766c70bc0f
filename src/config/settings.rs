use std::time::Duration;

use serde::Deserialize;

use crate::channel::{ChannelOptions, DEFAULT_TIMEOUT, DeliveryClass};

/// Top-level configuration settings for the gateway.
///
/// Includes one block per channel kind plus logging.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub cloud: ChannelSettings,
    pub local: ChannelSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for one channel.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    pub delivery_class: DeliveryClass,
    pub timeout_secs: u64,
}

impl ChannelSettings {
    pub fn options(&self) -> ChannelOptions {
        ChannelOptions::new(self.delivery_class, Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub cloud: Option<PartialChannelSettings>,
    pub local: Option<PartialChannelSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialChannelSettings {
    pub delivery_class: Option<DeliveryClass>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl PartialChannelSettings {
    pub fn merge(partial: Option<&Self>, default: ChannelSettings) -> ChannelSettings {
        ChannelSettings {
            delivery_class: partial
                .and_then(|c| c.delivery_class)
                .unwrap_or(default.delivery_class),
            timeout_secs: partial
                .and_then(|c| c.timeout_secs)
                .unwrap_or(default.timeout_secs),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            delivery_class: DeliveryClass::AtLeastOnce,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Provides default values for `Settings`.
///
/// Both channels wait at most ten seconds and ask for at-least-once delivery.
impl Default for Settings {
    fn default() -> Self {
        Self {
            cloud: ChannelSettings::default(),
            local: ChannelSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}
