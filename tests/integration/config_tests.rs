//! Config persistence through the NVS adapter's simulation backend.

use playbuttons::adapters::nvs::{MAX_BLOB_SIZE, NvsAdapter, decode_config};
use playbuttons::app::ports::{ConfigError, ConfigPort};
use playbuttons::app::service::AppService;
use playbuttons::config::{SystemConfig, bounded};

use crate::mock_hw::{LogSink, MockPanel, MockPublisher};

fn stage_config() -> SystemConfig {
    SystemConfig {
        device_name: bounded("foyer"),
        cooldown_ms: 8_000,
        mqtt_broker_url: bounded("mqtt://192.168.1.10:1883"),
        wifi_ssid: bounded("Backstage"),
        wifi_password: bounded("letmein123"),
        ..SystemConfig::default()
    }
}

#[test]
fn saved_config_survives_reload() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.save(&stage_config()).unwrap();
    assert_eq!(nvs.load().unwrap(), stage_config());
}

#[test]
fn stored_cooldown_drives_the_selector() {
    let nvs = NvsAdapter::new().unwrap();
    nvs.save(&stage_config()).unwrap();
    let config = nvs.load().unwrap();

    let mut app = AppService::new(&config);
    let mut panel = MockPanel::new();
    let mut mqtt = MockPublisher::new();
    let mut sink = LogSink::new();
    app.start(&mut panel, &mut sink);

    panel.hold(&[1]);
    app.tick(0, &mut panel, &mut mqtt, &mut sink);
    assert!(app.in_cooldown(8_000));
    assert!(!app.in_cooldown(8_001));
}

#[test]
fn truncated_blob_is_reported_corrupted() {
    let bytes = postcard::to_allocvec(&stage_config()).unwrap();
    let nvs = NvsAdapter::new().unwrap();
    nvs.inject_raw(&bytes[..bytes.len() / 2]);
    assert_eq!(nvs.load(), Err(ConfigError::Corrupted));
}

#[test]
fn decoded_blob_is_validated() {
    let bad = SystemConfig {
        cooldown_ms: 10,
        ..stage_config()
    };
    let bytes = postcard::to_allocvec(&bad).unwrap();
    assert!(matches!(
        decode_config(&bytes),
        Err(ConfigError::ValidationFailed(_))
    ));
}

#[test]
fn encoded_config_fits_blob_limit() {
    let max = SystemConfig {
        device_name: bounded(&"n".repeat(16)),
        mqtt_broker_url: bounded(&format!("mqtt://{}", "h".repeat(89))),
        mqtt_topic_prefix: bounded(&"p".repeat(32)),
        wifi_ssid: bounded(&"s".repeat(32)),
        wifi_password: bounded(&"w".repeat(64)),
        ..SystemConfig::default()
    };
    let bytes = postcard::to_allocvec(&max).unwrap();
    assert!(bytes.len() <= MAX_BLOB_SIZE);
    assert_eq!(decode_config(&bytes).unwrap(), max);
}
