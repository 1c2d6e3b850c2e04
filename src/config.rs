//! System configuration parameters
//!
//! All tunable parameters for the button panel.  Values are loaded from
//! NVS at boot; anything never stored falls back to the defaults below,
//! which may pick up WiFi and broker settings baked in at build time.

use serde::{Deserialize, Serialize};

use crate::selector::DEFAULT_COOLDOWN_MS;

pub type DeviceName = heapless::String<16>;
pub type BrokerUrl = heapless::String<96>;
pub type TopicPrefix = heapless::String<32>;
pub type Ssid = heapless::String<32>;
pub type WifiPassword = heapless::String<64>;

const DEFAULT_DEVICE_NAME: &str = "buttons01";
const DEFAULT_BROKER_URL: &str = "mqtt://showcontrol.local:1883";
const DEFAULT_TOPIC_PREFIX: &str = "show";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity ---
    /// Hostname prefix; the MAC suffix is appended at boot.
    pub device_name: DeviceName,

    // --- Selector timing ---
    /// Quiet window after a confirmed press (milliseconds)
    pub cooldown_ms: u32,
    /// Main loop yield between scans (milliseconds)
    pub scan_interval_ms: u32,

    // --- Show controller link ---
    /// MQTT broker URL (`mqtt://host:port` or `mqtts://...`)
    pub mqtt_broker_url: BrokerUrl,
    /// Prepended to every command name: `{prefix}/{command}`
    pub mqtt_topic_prefix: TopicPrefix,

    // --- WiFi station ---
    pub wifi_ssid: Ssid,
    /// Empty for open networks
    pub wifi_password: WifiPassword,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            device_name: bounded(DEFAULT_DEVICE_NAME),

            cooldown_ms: DEFAULT_COOLDOWN_MS as u32, // 15 s
            scan_interval_ms: 10,                    // 100 Hz

            mqtt_broker_url: bounded(
                option_env!("PLAYBUTTONS_MQTT_URL").unwrap_or(DEFAULT_BROKER_URL),
            ),
            mqtt_topic_prefix: bounded(DEFAULT_TOPIC_PREFIX),

            wifi_ssid: bounded(option_env!("PLAYBUTTONS_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("PLAYBUTTONS_WIFI_PASSWORD").unwrap_or("")),
        }
    }
}

impl SystemConfig {
    /// Whether station credentials are present at all.
    pub fn has_wifi_credentials(&self) -> bool {
        !self.wifi_ssid.is_empty()
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
