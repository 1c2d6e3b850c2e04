//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to                      |
//! |-------------|-------------------|----------------------------------|
//! | `panel`     | PanelPort         | MCP23017 over I²C                |
//! | `mqtt`      | CommandPublisher  | MQTT broker (ESP-IDF)            |
//! | `log_sink`  | EventSink         | Serial log output                |
//! | `nvs`       | ConfigPort        | NVS / in-memory store            |
//! | `wifi`      | ConnectivityPort  | ESP-IDF WiFi STA, setup AP       |
//! | `mdns`      | (advertisement)   | `{hostname}.local`, `_http._tcp` |
//! | `time`      | (monotonic clock) | ESP32 high-res timer             |
//! | `device_id` | (hostname)        | eFuse factory MAC                |

pub mod device_id;
pub mod log_sink;
pub mod mdns;
pub mod mqtt;
pub mod nvs;
pub mod panel;
pub mod time;
pub mod wifi;
