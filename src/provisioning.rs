//! First-boot WiFi setup.
//!
//! When the stored config has no station credentials, or the access point
//! refuses them, the device does not restart.  It opens an access point
//! named after its hostname and serves a small form on `/`.  Submitting the
//! form writes the new credentials (and optionally the broker URL and topic
//! prefix) through [`ConfigPort::save`]; the main loop then restarts into
//! station mode.
//!
//! Everything except the HTTP wiring is plain logic and runs on the host.

use core::fmt::Write as _;

use log::info;

use crate::adapters::nvs::validate_config;
use crate::adapters::wifi::{ConnectivityError, ConnectivityPort};
use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

/// Largest accepted form body.
pub const MAX_FORM_BYTES: usize = 512;

/// How boot continues after the station join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPath {
    /// Associated with the configured network.
    Station,
    /// Serve the setup portal; carries the reason the station path failed.
    Portal(ConnectivityError),
}

/// Try the configured network once and decide the boot path.
pub fn join_network(wifi: &mut impl ConnectivityPort, config: &SystemConfig) -> BootPath {
    if !config.has_wifi_credentials() {
        return BootPath::Portal(ConnectivityError::NoCredentials);
    }
    match wifi
        .set_credentials(&config.wifi_ssid, &config.wifi_password)
        .and_then(|()| wifi.connect())
    {
        Ok(()) => BootPath::Station,
        Err(e) => BootPath::Portal(e),
    }
}

// ── Form handling ─────────────────────────────────────────────

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode one `application/x-www-form-urlencoded` value.
fn form_decode(raw: &[u8]) -> Result<String, ConfigError> {
    const MALFORMED: ConfigError = ConfigError::ValidationFailed("malformed form encoding");

    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.next().and_then(hex_value).ok_or(MALFORMED)?;
                let lo = bytes.next().and_then(hex_value).ok_or(MALFORMED)?;
                out.push((hi << 4) | lo);
            }
            _ => out.push(b),
        }
    }
    String::from_utf8(out).map_err(|_| MALFORMED)
}

fn fit<const N: usize>(
    value: &str,
    too_long: &'static str,
) -> Result<heapless::String<N>, ConfigError> {
    let mut out = heapless::String::new();
    out.push_str(value)
        .map_err(|()| ConfigError::ValidationFailed(too_long))?;
    Ok(out)
}

/// Overlay a submitted setup form on `base`.
///
/// Recognised fields: `ssid`, `password`, `broker`, `prefix`.  Empty
/// `broker`/`prefix` keep the current value; unknown fields are ignored.
/// The result must pass [`validate_config`] and carry an SSID.
pub fn apply_form(base: &SystemConfig, body: &[u8]) -> Result<SystemConfig, ConfigError> {
    if body.len() > MAX_FORM_BYTES {
        return Err(ConfigError::TooLarge);
    }

    let mut cfg = base.clone();
    for pair in body.split(|&b| b == b'&').filter(|p| !p.is_empty()) {
        let (key, raw) = match pair.iter().position(|&b| b == b'=') {
            Some(i) => (&pair[..i], &pair[i + 1..]),
            None => (pair, &[][..]),
        };
        let value = form_decode(raw)?;
        match key {
            b"ssid" => cfg.wifi_ssid = fit(&value, "ssid longer than 32 bytes")?,
            b"password" => cfg.wifi_password = fit(&value, "password longer than 64 bytes")?,
            b"broker" if !value.is_empty() => {
                cfg.mqtt_broker_url = fit(&value, "broker URL longer than 96 bytes")?;
            }
            b"prefix" if !value.is_empty() => {
                cfg.mqtt_topic_prefix = fit(&value, "topic prefix longer than 32 bytes")?;
            }
            _ => {}
        }
    }

    if !cfg.has_wifi_credentials() {
        return Err(ConfigError::ValidationFailed("ssid required"));
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Apply the form and persist the result.
pub fn save_form(
    store: &impl ConfigPort,
    base: &SystemConfig,
    body: &[u8],
) -> Result<SystemConfig, ConfigError> {
    let cfg = apply_form(base, body)?;
    store.save(&cfg)?;
    info!(
        "Portal: saved credentials for '{}' (broker {})",
        cfg.wifi_ssid, cfg.mqtt_broker_url
    );
    Ok(cfg)
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// The setup form, pre-filled with the non-secret fields of `config`.
pub fn portal_page(config: &SystemConfig, hostname: &str) -> String {
    let mut page = String::with_capacity(1024);
    page.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width\"><title>");
    push_escaped(&mut page, hostname);
    page.push_str("</title></head><body><h1>");
    push_escaped(&mut page, hostname);
    page.push_str("</h1><form method=\"post\" action=\"/\">");
    page.push_str("<p>WiFi network<br><input name=\"ssid\" maxlength=\"32\" value=\"");
    push_escaped(&mut page, &config.wifi_ssid);
    page.push_str("\"></p><p>Password<br><input name=\"password\" type=\"password\" maxlength=\"64\"></p>");
    page.push_str("<p>MQTT broker<br><input name=\"broker\" maxlength=\"96\" value=\"");
    push_escaped(&mut page, &config.mqtt_broker_url);
    page.push_str("\"></p><p>Topic prefix<br><input name=\"prefix\" maxlength=\"32\" value=\"");
    push_escaped(&mut page, &config.mqtt_topic_prefix);
    let _ = write!(
        page,
        "\"></p><p><button type=\"submit\">Save</button></p></form><p>v{}</p></body></html>",
        env!("CARGO_PKG_VERSION")
    );
    page
}

// ── HTTP wiring ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub mod http {
    //! `GET /` serves the form; `POST /` saves it and raises the restart flag.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use esp_idf_svc::http::server::EspHttpServer;
    use esp_idf_svc::http::{Headers, Method};
    use esp_idf_svc::io::{Read, Write};
    use log::{info, warn};

    use super::{MAX_FORM_BYTES, portal_page, save_form};
    use crate::adapters::nvs::NvsAdapter;
    use crate::config::SystemConfig;

    /// Add the portal handlers to `server`.  `saved` goes high once new
    /// settings are in NVS.
    pub fn register(
        server: &mut EspHttpServer<'static>,
        nvs: NvsAdapter,
        base: SystemConfig,
        hostname: &str,
        saved: Arc<AtomicBool>,
    ) -> anyhow::Result<()> {
        let page = portal_page(&base, hostname);
        server.fn_handler("/", Method::Get, move |req| -> anyhow::Result<()> {
            req.into_response(200, None, &[("Content-Type", "text/html; charset=utf-8")])?
                .write_all(page.as_bytes())?;
            Ok(())
        })?;

        server.fn_handler("/", Method::Post, move |mut req| -> anyhow::Result<()> {
            let len = req
                .content_len()
                .and_then(|len| usize::try_from(len).ok())
                .unwrap_or(0);
            if len > MAX_FORM_BYTES {
                req.into_status_response(413)?.write_all(b"form too large")?;
                return Ok(());
            }

            let mut body = [0u8; MAX_FORM_BYTES];
            let mut filled = 0;
            while filled < len {
                let n = req.read(&mut body[filled..len])?;
                if n == 0 {
                    break;
                }
                filled += n;
            }

            match save_form(&nvs, &base, &body[..filled]) {
                Ok(_) => {
                    saved.store(true, Ordering::Release);
                    req.into_ok_response()?
                        .write_all(b"Saved. Restarting to join the network.")?;
                }
                Err(e) => {
                    warn!("Portal: rejected submission: {}", e);
                    req.into_status_response(400)?
                        .write_all(e.to_string().as_bytes())?;
                }
            }
            Ok(())
        })?;

        info!("Portal: setup form ready on /");
        Ok(())
    }
}
