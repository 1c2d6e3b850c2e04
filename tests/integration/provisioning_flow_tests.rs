//! First-boot flow: no credentials → setup portal → stored settings →
//! station join on the next boot.

use playbuttons::adapters::device_id;
use playbuttons::adapters::nvs::NvsAdapter;
use playbuttons::adapters::wifi::{ConnectivityError, ConnectivityPort, SimLink, WifiAdapter, WifiState};
use playbuttons::app::ports::ConfigPort;
use playbuttons::config::{SystemConfig, bounded};
use playbuttons::provisioning::{BootPath, join_network, save_form};

fn factory_config() -> SystemConfig {
    SystemConfig {
        wifi_ssid: bounded(""),
        wifi_password: bounded(""),
        ..SystemConfig::default()
    }
}

#[test]
fn blank_device_opens_portal_instead_of_joining() {
    // Empty store: the boot path loads defaults.
    let nvs = NvsAdapter::new().unwrap();
    assert_eq!(nvs.load(), Ok(SystemConfig::default()));
    let config = factory_config();

    let mut wifi = WifiAdapter::new(SimLink::default());
    let path = join_network(&mut wifi, &config);
    assert_eq!(path, BootPath::Portal(ConnectivityError::NoCredentials));
    assert_eq!(wifi.driver().attempts, 0, "no association with an empty SSID");

    let hostname = device_id::hostname(&config.device_name, &device_id::read_mac());
    wifi.start_access_point(&hostname).unwrap();
    assert_eq!(wifi.state(), WifiState::AccessPoint);
    assert_eq!(wifi.driver().access_point.as_deref(), Some("buttons01-EFCAFE"));
}

#[test]
fn wrong_password_falls_back_to_portal() {
    let mut wifi = WifiAdapter::new(SimLink {
        accept: false,
        ..SimLink::default()
    });
    let config = SystemConfig {
        wifi_ssid: bounded("Backstage"),
        wifi_password: bounded("not-the-one"),
        ..SystemConfig::default()
    };
    assert_eq!(
        join_network(&mut wifi, &config),
        BootPath::Portal(ConnectivityError::ConnectionFailed)
    );
    assert!(!wifi.is_connected());
}

#[test]
fn portal_submission_lets_the_next_boot_join() {
    let nvs = NvsAdapter::new().unwrap();
    let base = factory_config();

    save_form(
        &nvs,
        &base,
        b"ssid=Backstage&password=letmein123&broker=mqtt%3A%2F%2F192.168.1.10%3A1883&prefix=foyer",
    )
    .unwrap();

    // Next boot.
    let config = nvs.load().unwrap();
    assert_eq!(config.mqtt_topic_prefix.as_str(), "foyer");
    assert_eq!(config.cooldown_ms, base.cooldown_ms);

    let mut wifi = WifiAdapter::new(SimLink::default());
    assert_eq!(join_network(&mut wifi, &config), BootPath::Station);
    assert!(wifi.is_connected());
}
