//! Device identity derived from the ESP32 factory MAC address.
//!
//! The hostname is `{device_name}-XXYYZZ` (last 3 MAC bytes, upper-case
//! hex).  It is stable across reboots and doubles as the MQTT client id.

use core::fmt::Write;

/// Fixed-size hostname: 16-byte name + `-` + 6 hex digits.
pub type Hostname = heapless::String<24>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `{device_name}-XXYYZZ`, e.g. `buttons01-EFCAFE`.
pub fn hostname(device_name: &str, mac: &MacAddress) -> Hostname {
    let mut name = Hostname::new();
    let _ = write!(
        name,
        "{}-{:02X}{:02X}{:02X}",
        device_name, mac[3], mac[4], mac[5]
    );
    name
}
