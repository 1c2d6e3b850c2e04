//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the hexagonal boundary for network
//! connectivity.  When no usable credentials exist the same radio is
//! switched to an open access point for the setup portal
//! ([`WifiAdapter::start_access_point`]).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: wraps `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: an in-memory [`SimLink`] for host-side tests.
//!
//! ## Reconnection policy
//!
//! The first [`connect`](ConnectivityPort::connect) blocks until the
//! netif is up.  After a link loss, [`poll`](ConnectivityPort::poll)
//! issues a non-blocking reconnect request whenever the backoff expires
//! (2 s → 4 s → 8 s … capped at 60 s) and watches for the link to come
//! back, so the scan loop is never held up by the radio.

use core::fmt;
use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, ClientConfiguration, Configuration,
    EspWifi,
};

// ───────────────────────────────────────────────────────────────
// Port trait
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Advance the reconnect state machine at monotonic `now_ms`.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    /// Serving the setup access point; the station side is idle.
    AccessPoint,
}

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Platform link
// ───────────────────────────────────────────────────────────────

/// Radio driver owned by the adapter.
#[cfg(target_os = "espidf")]
pub type WifiDriver = BlockingWifi<EspWifi<'static>>;

/// Radio driver owned by the adapter.
#[cfg(not(target_os = "espidf"))]
pub type WifiDriver = SimLink;

/// Host stand-in for the radio.  Tests flip `accept` and `up` to
/// script association failures and link drops.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct SimLink {
    /// Whether the next association attempt succeeds.
    pub accept: bool,
    /// Current link state.
    pub up: bool,
    /// Association attempts seen so far (blocking and non-blocking).
    pub attempts: u32,
    /// SSID of the access point being served, if any.
    pub access_point: Option<String>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimLink {
    fn default() -> Self {
        Self {
            accept: true,
            up: false,
            attempts: 0,
            access_point: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    driver: WifiDriver,
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u64,
    next_attempt_ms: u64,
    last_rssi: Option<i8>,
}

impl WifiAdapter {
    pub fn new(driver: WifiDriver) -> Self {
        Self {
            driver,
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            last_rssi: None,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Current reconnect delay.
    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    pub fn driver(&self) -> &WifiDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut WifiDriver {
        &mut self.driver
    }

    /// Switch the radio to an open access point named `ssid`.
    ///
    /// Any station association is dropped.  Reconnect polling stops until
    /// the device restarts with stored credentials.
    pub fn start_access_point(&mut self, ssid: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        self.platform_start_access_point(ssid)?;
        self.state = WifiState::AccessPoint;
        self.last_rssi = None;
        info!("WiFi: access point '{}' up", ssid);
        Ok(())
    }

    fn on_link_up(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
        self.last_rssi = self.platform_rssi();
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            error!("WiFi(espidf): {}", e);
            ConnectivityError::ConnectionFailed
        };
        self.driver.set_configuration(&config).map_err(fail)?;
        if !self.driver.is_started().map_err(fail)? {
            self.driver.start().map_err(fail)?;
        }
        self.driver.connect().map_err(fail)?;
        self.driver.wait_netif_up().map_err(fail)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        self.driver.attempts += 1;
        if !self.driver.accept {
            warn!("WiFi(sim): association rejected (attempt {})", self.driver.attempts);
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.driver.up = true;
        info!("WiFi(sim): associated with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_access_point(&mut self, ssid: &str) -> Result<(), ConnectivityError> {
        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            auth_method: AuthMethod::None,
            channel: 1,
            ..Default::default()
        });

        let fail = |e: esp_idf_svc::sys::EspError| {
            error!("WiFi(espidf): access point: {}", e);
            ConnectivityError::ConnectionFailed
        };
        if self.driver.is_started().map_err(fail)? {
            self.driver.stop().map_err(fail)?;
        }
        self.driver.set_configuration(&config).map_err(fail)?;
        self.driver.start().map_err(fail)?;
        self.driver.wait_netif_up().map_err(fail)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_access_point(&mut self, ssid: &str) -> Result<(), ConnectivityError> {
        self.driver.up = false;
        self.driver.access_point = Some(ssid.to_string());
        Ok(())
    }

    /// Fire a reconnect request without waiting for the result.
    #[cfg(target_os = "espidf")]
    fn platform_request_reconnect(&mut self) {
        if let Err(e) = self.driver.wifi_mut().connect() {
            warn!("WiFi(espidf): reconnect request failed: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_request_reconnect(&mut self) {
        self.driver.attempts += 1;
        if self.driver.accept {
            self.driver.up = true;
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.driver.disconnect() {
            warn!("WiFi(espidf): disconnect: {}", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.driver.up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.driver.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.driver.up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        // SAFETY: `ap_info` is a plain C struct filled by the driver.
        unsafe {
            let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = core::mem::zeroed();
            if esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) == esp_idf_svc::sys::ESP_OK
            {
                Some(ap_info.rssi)
            } else {
                None
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        self.driver.up.then_some(-60)
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.on_link_up();
                info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Disconnected;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.platform_link_up()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected => {
                if !self.platform_link_up() {
                    warn!(
                        "WiFi: connection lost, retrying in {} ms",
                        self.backoff_ms
                    );
                    self.state = WifiState::Reconnecting { attempt: 0 };
                    self.next_attempt_ms = now_ms + self.backoff_ms;
                    self.last_rssi = None;
                }
            }
            WifiState::Reconnecting { attempt } => {
                if self.platform_link_up() {
                    self.on_link_up();
                    info!(
                        "WiFi: reconnected after {} attempt(s) (RSSI={:?})",
                        attempt, self.last_rssi
                    );
                } else if now_ms >= self.next_attempt_ms {
                    info!(
                        "WiFi: reconnect attempt {} (backoff {} ms)",
                        attempt + 1,
                        self.backoff_ms
                    );
                    self.platform_request_reconnect();
                    self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
                    self.next_attempt_ms = now_ms + self.backoff_ms;
                    self.state = WifiState::Reconnecting {
                        attempt: attempt + 1,
                    };
                }
            }
            WifiState::Disconnected | WifiState::Connecting | WifiState::AccessPoint => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
