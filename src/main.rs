//! Playbuttons firmware main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  ExpanderPanel   MqttPublisher     LogEventSink   NvsAdapter   │
//! │  (PanelPort)     (CommandPublisher)(EventSink)    (ConfigPort) │
//! │  WifiAdapter     OTA HTTP server   MdnsAdapter   MonotonicClock│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Selector · cooldown · trigger sequence                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Without working station credentials the device never reaches the
//! scan loop: it serves the setup portal on its own access point and
//! restarts once new settings are stored.
#![deny(unused_must_use)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use playbuttons::adapters::device_id;
use playbuttons::adapters::log_sink::LogEventSink;
use playbuttons::adapters::mdns::MdnsAdapter;
use playbuttons::adapters::mqtt::MqttPublisher;
use playbuttons::adapters::nvs::NvsAdapter;
use playbuttons::adapters::panel::ExpanderPanel;
use playbuttons::adapters::time::MonotonicClock;
use playbuttons::adapters::wifi::{ConnectivityPort, WifiAdapter};
use playbuttons::app::ports::ConfigPort;
use playbuttons::app::service::AppService;
use playbuttons::config::SystemConfig;
use playbuttons::drivers::mcp23017::Mcp23017;
use playbuttons::drivers::status_led::StatusLed;
use playbuttons::drivers::watchdog::Watchdog;
use playbuttons::error::Error;
use playbuttons::ota::{self, OtaManager, OtaPoll, OtaState, SharedOta};
use playbuttons::pins;
use playbuttons::provisioning::{self, BootPath};

// `main` takes gpio21/gpio22 from the typed peripheral set.
const _: () = assert!(pins::I2C_SDA_GPIO == 21 && pins::I2C_SCL_GPIO == 22);

/// Blink period of the status LED while the setup portal is up.
const PORTAL_BLINK_MS: u32 = 500;
/// Grace period for the portal's HTTP reply before restarting.
const PORTAL_RESTART_DELAY_MS: u32 = 1_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Playbuttons v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    ota::check_rollback();

    let mut status_led = StatusLed::new(pins::STATUS_LED_GPIO);
    status_led.on();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let nvs = NvsAdapter::new();
    let loaded = match &nvs {
        Ok(nvs) => nvs.load().map_err(Error::from),
        Err(e) => Err(Error::from(*e)),
    };
    let config = loaded.unwrap_or_else(|e| {
        warn!("NVS: {}, using defaults", e);
        SystemConfig::default()
    });
    let hostname = device_id::hostname(&config.device_name, &device_id::read_mac());
    info!("Device: {}", hostname);

    // ── 3. Button panel ───────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;
    let mut panel = match ExpanderPanel::new(Mcp23017::new(i2c, pins::EXPANDER_ADDRESS)) {
        Ok(panel) => panel,
        Err(e) => {
            let e = Error::from(e);
            loop {
                // Without the expander there is nothing to do.
                error!("Panel: MCP23017 at 0x{:02X} unavailable: {}", pins::EXPANDER_ADDRESS, e);
                FreeRtos::delay_ms(5_000);
            }
        }
    };

    let mut sink = LogEventSink::new();
    let mut app = AppService::new(&config);
    app.start(&mut panel, &mut sink);

    // ── 4. WiFi (or setup portal) ─────────────────────────────
    let mut esp_wifi = EspWifi::new(
        peripherals.modem,
        sysloop.clone(),
        Some(EspDefaultNvsPartition::take()?),
    )?;
    esp_wifi.sta_netif_mut().set_hostname(&hostname)?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?);

    let ota_manager: SharedOta = Arc::new(Mutex::new(OtaManager::new()));

    if let BootPath::Portal(reason) = provisioning::join_network(&mut wifi, &config) {
        warn!("WiFi: {}, opening setup portal", Error::from(reason));
        let nvs = nvs.map_err(Error::from)?;
        return run_portal(&mut wifi, nvs, &config, &hostname, &ota_manager, &mut status_led);
    }

    // ── 5. Show controller link + OTA endpoint ────────────────
    let mut mqtt = MqttPublisher::connect(&config, &hostname)?;
    let _ota_server = ota::http::serve(Arc::clone(&ota_manager))?;

    let mut mdns = MdnsAdapter::new(hostname.clone());
    mdns.start();

    // ── 6. Ready ──────────────────────────────────────────────
    let mut watchdog = Watchdog::new();
    let clock = MonotonicClock::new();
    status_led.off();
    info!(
        "System ready. Scanning every {} ms, cooldown {} ms.",
        config.scan_interval_ms, config.cooldown_ms
    );

    let mut ota_decile = 0u8;

    loop {
        poll_ota(&ota_manager, &mut ota_decile)?;

        let now_ms = clock.uptime_ms();
        wifi.poll(now_ms);
        mdns.track_link(wifi.is_connected());
        app.tick(now_ms, &mut panel, &mut mqtt, &mut sink);

        watchdog.feed();
        FreeRtos::delay_ms(config.scan_interval_ms);
    }
}

/// Log OTA progress by decile and restart once an image is ready.
/// Skips the iteration while the upload handler holds the manager.
fn poll_ota(ota: &SharedOta, decile: &mut u8) -> Result<()> {
    match ota::try_poll(ota).map_err(Error::from)? {
        OtaPoll::Busy => {}
        OtaPoll::Seen(OtaState::ReadyToReboot, _) => ota::reboot(),
        OtaPoll::Seen(OtaState::Receiving { .. }, progress) if progress / 10 != *decile => {
            *decile = progress / 10;
            info!("OTA: {}%", progress);
        }
        OtaPoll::Seen(OtaState::Idle | OtaState::Failed, _) => *decile = 0,
        OtaPoll::Seen(..) => {}
    }
    Ok(())
}

/// Serve the setup form on an open access point named after the device
/// until new settings are saved, then restart into station mode.
fn run_portal(
    wifi: &mut WifiAdapter,
    nvs: NvsAdapter,
    config: &SystemConfig,
    hostname: &str,
    ota_manager: &SharedOta,
    status_led: &mut StatusLed,
) -> Result<()> {
    wifi.start_access_point(hostname).map_err(Error::from)?;

    let saved = Arc::new(AtomicBool::new(false));
    let mut server = ota::http::serve(Arc::clone(ota_manager))?;
    provisioning::http::register(
        &mut server,
        nvs,
        config.clone(),
        hostname,
        Arc::clone(&saved),
    )?;

    let ip = wifi.driver().wifi().ap_netif().get_ip_info()?.ip;
    info!("Portal: join '{}' and open http://{}/", hostname, ip);

    let mut watchdog = Watchdog::new();
    let mut ota_decile = 0u8;

    loop {
        if saved.load(Ordering::Acquire) {
            info!("Portal: settings stored, restarting");
            FreeRtos::delay_ms(PORTAL_RESTART_DELAY_MS);
            esp_idf_svc::hal::reset::restart();
        }
        poll_ota(ota_manager, &mut ota_decile)?;

        status_led.set(!status_led.is_lit());
        watchdog.feed();
        FreeRtos::delay_ms(PORTAL_BLINK_MS);
    }
}
