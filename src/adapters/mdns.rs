//! mDNS advertisement adapter.
//!
//! Publishes `{hostname}.local` and an `_http._tcp` service on port 80
//! with TXT records `path=/update` and the firmware version, so the
//! update endpoint is reachable by name.  Uses the ESP-IDF mDNS
//! component on device and is a no-op on simulation targets.
//!
//! Lifecycle follows the station link: start once WiFi is up, stop when
//! it drops.

use log::info;

use crate::adapters::device_id::Hostname;

const HTTP_SERVICE_TYPE: &str = "_http";
const HTTP_SERVICE_PROTO: &str = "_tcp";
const HTTP_PORT: u16 = 80;
const UPDATE_PATH: &str = "/update";

/// mDNS advertisement adapter.
pub struct MdnsAdapter {
    hostname: Hostname,
    active: bool,
}

impl MdnsAdapter {
    pub fn new(hostname: Hostname) -> Self {
        Self {
            hostname,
            active: false,
        }
    }

    /// Whether mDNS is currently advertising.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Follow the station link: advertise while it is up, withdraw when
    /// it is down.
    pub fn track_link(&mut self, link_up: bool) {
        match (link_up, self.active) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// Start hostname + service advertisement.
    /// Call after WiFi is connected and has an IP.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.active = self.platform_start();
        if self.active {
            info!(
                "mDNS: advertising {}.local {}.{}:{}{}",
                self.hostname, HTTP_SERVICE_TYPE, HTTP_SERVICE_PROTO, HTTP_PORT, UPDATE_PATH
            );
        }
    }

    /// Stop advertisement.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.platform_stop();
        self.active = false;
        info!("mDNS: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&self) -> bool {
        use esp_idf_svc::sys::*;

        // Every string handed to the C API is NUL-terminated.
        let mut hostname_buf = [0u8; 32];
        let hb = self.hostname.as_bytes();
        let hl = hb.len().min(31);
        hostname_buf[..hl].copy_from_slice(&hb[..hl]);
        let version = concat!(env!("CARGO_PKG_VERSION"), "\0");
        let svc_type = b"_http\0";
        let svc_proto = b"_tcp\0";

        // SAFETY: mdns_* calls run from the main task only; all pointers
        // refer to NUL-terminated buffers that outlive each call (the
        // component copies them).
        unsafe {
            let ret = mdns_init();
            if ret != ESP_OK {
                log::error!("mDNS: mdns_init failed ({})", ret);
                return false;
            }
            mdns_hostname_set(hostname_buf.as_ptr() as *const _);
            mdns_instance_name_set(b"Playbuttons panel\0".as_ptr() as *const _);

            let ret = mdns_service_add(
                hostname_buf.as_ptr() as *const _,
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                HTTP_PORT,
                core::ptr::null_mut(),
                0,
            );
            if ret != ESP_OK {
                log::warn!("mDNS: service add failed ({}), hostname only", ret);
                return true;
            }

            mdns_service_txt_item_set(
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                b"path\0".as_ptr() as *const _,
                b"/update\0".as_ptr() as *const _,
            );
            mdns_service_txt_item_set(
                svc_type.as_ptr() as *const _,
                svc_proto.as_ptr() as *const _,
                b"version\0".as_ptr() as *const _,
                version.as_ptr() as *const _,
            );
        }
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&self) -> bool {
        info!(
            "mDNS(sim): registered {}.local v={}",
            self.hostname,
            env!("CARGO_PKG_VERSION")
        );
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&self) {
        // SAFETY: releases everything mdns_init allocated.
        unsafe {
            esp_idf_svc::sys::mdns_free();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&self) {
        info!("mDNS(sim): unregistered");
    }
}
