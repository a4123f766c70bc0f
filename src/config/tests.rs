use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::settings::Settings;
use super::{ChannelSettings, load_config_from};
use crate::channel::DeliveryClass;

fn missing_file(tmp: &TempDir) -> String {
    tmp.path().join("absent").to_str().unwrap().to_string()
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.cloud.delivery_class, DeliveryClass::AtLeastOnce);
    assert_eq!(settings.cloud.timeout_secs, 10);
    assert_eq!(settings.local.delivery_class, DeliveryClass::AtLeastOnce);
    assert_eq!(settings.local.timeout_secs, 10);
    assert_eq!(settings.logging.level, "info");
}

#[test]
fn test_channel_settings_to_options() {
    let settings = ChannelSettings {
        delivery_class: DeliveryClass::AtMostOnce,
        timeout_secs: 3,
    };
    let options = settings.options();
    assert_eq!(options.delivery_class, DeliveryClass::AtMostOnce);
    assert_eq!(options.timeout, Duration::from_secs(3));
}

#[test]
#[serial]
fn test_load_without_sources_uses_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let settings = load_config_from(&missing_file(&tmp)).expect("load_config failed");
    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("gateway.toml");
    let toml = r#"
        [cloud]
        delivery_class = "at_most_once"

        [local]
        timeout_secs = 4

        [logging]
        level = "debug"
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.cloud.delivery_class, DeliveryClass::AtMostOnce);
    assert_eq!(cfg.cloud.timeout_secs, 10);
    assert_eq!(cfg.local.delivery_class, DeliveryClass::AtLeastOnce);
    assert_eq!(cfg.local.timeout_secs, 4);
    assert_eq!(cfg.logging.level, "debug");
}

#[test]
#[serial]
fn test_environment_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    temp_env::with_vars(
        [
            ("GGMQ__LOCAL__TIMEOUT_SECS", Some("2")),
            ("GGMQ__LOCAL__DELIVERY_CLASS", Some("at_most_once")),
            ("GGMQ__LOGGING__LEVEL", Some("warn")),
        ],
        || {
            let cfg = load_config_from(&missing_file(&tmp)).expect("load_config failed");
            assert_eq!(cfg.local.timeout_secs, 2);
            assert_eq!(cfg.local.delivery_class, DeliveryClass::AtMostOnce);
            assert_eq!(cfg.cloud, ChannelSettings::default());
            assert_eq!(cfg.logging.level, "warn");
        },
    );
}

#[test]
#[serial]
fn test_zero_timeout_is_rejected() {
    let tmp = TempDir::new().expect("create tempdir");
    temp_env::with_var("GGMQ__CLOUD__TIMEOUT_SECS", Some("0"), || {
        let err = load_config_from(&missing_file(&tmp)).unwrap_err();
        assert!(err.to_string().contains("cloud.timeout_secs"));
    });
}

#[test]
#[serial]
fn test_unknown_delivery_class_is_an_error() {
    let tmp = TempDir::new().expect("create tempdir");
    temp_env::with_var("GGMQ__CLOUD__DELIVERY_CLASS", Some("exactly_once"), || {
        assert!(load_config_from(&missing_file(&tmp)).is_err());
    });
}
