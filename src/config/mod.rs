mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::{PartialChannelSettings, PartialSettings};

pub use settings::{ChannelSettings, LoggingSettings, Settings};

/// Prefix of environment variables read by `load_config`, e.g.
/// `GGMQ__LOCAL__TIMEOUT_SECS=5`.
pub const ENV_PREFIX: &str = "GGMQ";

/// Loads the configuration from `.env`, the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing both channel configurations and logging
pub fn load_config() -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from("config/default")
}

/// Same as `load_config` but reads the given file (extension optional) and
/// does not look at `.env`.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    let settings = Settings {
        cloud: PartialChannelSettings::merge(partial.cloud.as_ref(), default.cloud),
        local: PartialChannelSettings::merge(partial.local.as_ref(), default.local),
        logging: LoggingSettings {
            level: partial
                .logging
                .and_then(|l| l.level)
                .unwrap_or(default.logging.level),
        },
    };

    for (name, channel) in [("cloud", &settings.cloud), ("local", &settings.local)] {
        if channel.timeout_secs == 0 {
            return Err(ConfigError::Message(format!(
                "{name}.timeout_secs must be greater than zero"
            )));
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests;
