//! Over-the-air firmware update, backed by the `esp-ota` crate.
//!
//! Flow: `POST /update` (raw image as the request body) → `begin` →
//! N × `write_chunk` → `finalize` → the main loop sees `ReadyToReboot`
//! and restarts into the new image.
//!
//! The HTTP handler runs on the server's own task and holds the
//! [`SharedOta`] lock across `begin` (which erases the target partition)
//! and each `write_chunk`.  The main loop therefore never blocks on it:
//! [`try_poll`] takes the lock only if it is free and reports
//! [`OtaPoll::Busy`] otherwise.

use core::fmt;
use std::sync::{Arc, Mutex, TryLockError};

use log::{info, warn};
use serde::Serialize;

const MAX_FIRMWARE_SIZE: u32 = 4 * 1024 * 1024; // 4 MB

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    AlreadyInProgress,
    InvalidSize,
    BeginFailed,
    WriteFailed,
    VerifyFailed,
    BootSetFailed,
    IncompleteTransfer,
    NotReceiving,
    NonSequential,
    Overflow,
    /// A handler panicked while holding the shared manager.
    Poisoned,
}

impl fmt::Display for OtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInProgress => write!(f, "OTA session already in progress"),
            Self::InvalidSize => write!(f, "firmware size out of range (max 4 MB)"),
            Self::BeginFailed => write!(f, "OTA begin failed"),
            Self::WriteFailed => write!(f, "OTA write failed"),
            Self::VerifyFailed => write!(f, "OTA verification failed"),
            Self::BootSetFailed => write!(f, "set boot partition failed"),
            Self::IncompleteTransfer => write!(f, "finalize called before all bytes written"),
            Self::NotReceiving => write!(f, "operation requires active Receiving state"),
            Self::NonSequential => write!(f, "chunk offset does not match expected offset"),
            Self::Overflow => write!(f, "chunk would exceed declared firmware size"),
            Self::Poisoned => write!(f, "OTA state lock poisoned"),
        }
    }
}

// ── State machine ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaState {
    Idle,
    Receiving {
        expected_size: u32,
        bytes_written: u32,
    },
    Verifying,
    ReadyToReboot,
    Failed,
}

/// Snapshot served as JSON on `GET /update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OtaStatus {
    pub state: &'static str,
    pub progress: u8,
    pub bytes_written: u32,
    pub expected_size: u32,
}

// ── Manager ───────────────────────────────────────────────────

/// OTA firmware update manager.
///
/// On ESP-IDF targets the image goes to the inactive OTA partition via
/// `esp-ota`.  On simulation targets only the bookkeeping runs.
pub struct OtaManager {
    state: OtaState,
    #[cfg(target_os = "espidf")]
    ota_update: Option<esp_ota::OtaUpdate>,
}

impl OtaManager {
    pub fn new() -> Self {
        Self {
            state: OtaState::Idle,
            #[cfg(target_os = "espidf")]
            ota_update: None,
        }
    }

    pub fn state(&self) -> OtaState {
        self.state
    }

    /// Begin an OTA session. Validates size and opens the inactive partition.
    ///
    /// A previous `Failed` session may be restarted.
    pub fn begin(&mut self, firmware_size: u32) -> Result<(), OtaError> {
        if !matches!(self.state, OtaState::Idle | OtaState::Failed) {
            return Err(OtaError::AlreadyInProgress);
        }
        if firmware_size == 0 || firmware_size > MAX_FIRMWARE_SIZE {
            return Err(OtaError::InvalidSize);
        }

        #[cfg(target_os = "espidf")]
        {
            let update = esp_ota::OtaUpdate::begin().map_err(|e| {
                warn!("esp-ota begin failed: {:?}", e);
                OtaError::BeginFailed
            })?;
            self.ota_update = Some(update);
        }

        self.state = OtaState::Receiving {
            expected_size: firmware_size,
            bytes_written: 0,
        };
        info!("OTA: begin ({} bytes)", firmware_size);
        Ok(())
    }

    /// Write a chunk at the given byte offset. Returns total bytes written.
    pub fn write_chunk(&mut self, offset: u32, data: &[u8]) -> Result<u32, OtaError> {
        let OtaState::Receiving {
            expected_size,
            bytes_written,
        } = self.state
        else {
            return Err(OtaError::NotReceiving);
        };

        if offset != bytes_written {
            return Err(OtaError::NonSequential);
        }
        let len = u32::try_from(data.len()).map_err(|_| OtaError::Overflow)?;
        let new_written = bytes_written.checked_add(len).ok_or(OtaError::Overflow)?;
        if new_written > expected_size {
            return Err(OtaError::Overflow);
        }

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.as_mut() else {
                return Err(OtaError::NotReceiving);
            };
            if let Err(e) = update.write(data) {
                warn!("esp-ota write failed: {:?}", e);
                self.ota_update = None;
                self.state = OtaState::Failed;
                return Err(OtaError::WriteFailed);
            }
        }

        self.state = OtaState::Receiving {
            expected_size,
            bytes_written: new_written,
        };
        Ok(new_written)
    }

    /// Finalize: verify image, mark partition bootable, set ReadyToReboot.
    pub fn finalize(&mut self) -> Result<(), OtaError> {
        match self.state {
            OtaState::Receiving {
                expected_size,
                bytes_written,
            } if bytes_written == expected_size => {}
            OtaState::Receiving { .. } => return Err(OtaError::IncompleteTransfer),
            _ => return Err(OtaError::NotReceiving),
        }

        self.state = OtaState::Verifying;

        #[cfg(target_os = "espidf")]
        {
            let Some(update) = self.ota_update.take() else {
                self.state = OtaState::Failed;
                return Err(OtaError::NotReceiving);
            };
            let mut completed = update.finalize().map_err(|e| {
                warn!("esp-ota finalize failed: {:?}", e);
                self.state = OtaState::Failed;
                OtaError::VerifyFailed
            })?;
            completed.set_as_boot_partition().map_err(|e| {
                warn!("esp-ota set_as_boot_partition failed: {:?}", e);
                self.state = OtaState::Failed;
                OtaError::BootSetFailed
            })?;
        }

        self.state = OtaState::ReadyToReboot;
        info!("OTA: finalized, ready to reboot");
        Ok(())
    }

    /// Abort the current OTA session; resets to Idle.
    pub fn abort(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            // esp-ota aborts automatically when OtaUpdate is dropped
            self.ota_update.take();
        }
        self.state = OtaState::Idle;
        warn!("OTA: aborted");
    }

    /// 0–100.  Verifying and ReadyToReboot count as complete.
    pub fn progress_percent(&self) -> u8 {
        match self.state {
            OtaState::Receiving {
                expected_size,
                bytes_written,
            } if expected_size > 0 => {
                (u64::from(bytes_written) * 100 / u64::from(expected_size)) as u8
            }
            OtaState::Verifying | OtaState::ReadyToReboot => 100,
            _ => 0,
        }
    }

    pub fn status(&self) -> OtaStatus {
        let (state, bytes_written, expected_size) = match self.state {
            OtaState::Idle => ("idle", 0, 0),
            OtaState::Receiving {
                expected_size,
                bytes_written,
            } => ("receiving", bytes_written, expected_size),
            OtaState::Verifying => ("verifying", 0, 0),
            OtaState::ReadyToReboot => ("ready_to_reboot", 0, 0),
            OtaState::Failed => ("failed", 0, 0),
        };
        OtaStatus {
            state,
            progress: self.progress_percent(),
            bytes_written,
            expected_size,
        }
    }
}

impl Default for OtaManager {
    fn default() -> Self {
        Self::new()
    }
}

// ── Shared access ─────────────────────────────────────────────

/// Manager shared between the HTTP task and the main loop.
pub type SharedOta = Arc<Mutex<OtaManager>>;

/// Result of one non-blocking look at the shared manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaPoll {
    /// The upload handler holds the lock (partition erase or flash write).
    Busy,
    /// Current state and progress percentage.
    Seen(OtaState, u8),
}

/// Read state and progress without waiting for the upload handler.
pub fn try_poll(ota: &Mutex<OtaManager>) -> Result<OtaPoll, OtaError> {
    match ota.try_lock() {
        Ok(manager) => Ok(OtaPoll::Seen(manager.state(), manager.progress_percent())),
        Err(TryLockError::WouldBlock) => Ok(OtaPoll::Busy),
        Err(TryLockError::Poisoned(_)) => Err(OtaError::Poisoned),
    }
}

/// Soft-reset into the newly flashed firmware.
#[cfg(target_os = "espidf")]
pub fn reboot() -> ! {
    info!("OTA: rebooting into new firmware");
    esp_ota::restart();
}

// ── Boot validation ───────────────────────────────────────────

/// Check OTA image state on startup and mark this firmware as valid.
///
/// Without this, the bootloader rolls back to the previous image on the
/// next reset.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    info!("OTA rollback check (simulation): skipped");
}

// ── HTTP transport ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub mod http {
    //! `POST /update` streams the request body into the shared manager;
    //! `GET /update` returns the current [`OtaStatus`] as JSON.

    use std::sync::{Arc, MutexGuard};

    use anyhow::anyhow;
    use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
    use esp_idf_svc::http::{Headers, Method};
    use esp_idf_svc::io::{Read, Write};
    use log::{info, warn};

    use super::{OtaError, OtaManager, OtaState, SharedOta};

    const CHUNK_SIZE: usize = 2048;

    fn lock(ota: &SharedOta) -> anyhow::Result<MutexGuard<'_, OtaManager>> {
        ota.lock().map_err(|_| anyhow!("OTA state poisoned"))
    }

    fn receive(
        req: &mut Request<&mut EspHttpConnection<'_>>,
        ota: &SharedOta,
        size: u32,
    ) -> anyhow::Result<Result<(), OtaError>> {
        if let Err(e) = lock(ota)?.begin(size) {
            return Ok(Err(e));
        }

        let mut buf = [0u8; CHUNK_SIZE];
        let mut offset = 0u32;
        loop {
            let n = match req.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("OTA: body read failed: {:?}", e);
                    lock(ota)?.abort();
                    return Ok(Err(OtaError::IncompleteTransfer));
                }
            };
            let mut manager = lock(ota)?;
            match manager.write_chunk(offset, &buf[..n]) {
                Ok(written) => offset = written,
                Err(e) => {
                    if matches!(manager.state(), OtaState::Receiving { .. }) {
                        manager.abort();
                    }
                    return Ok(Err(e));
                }
            }
        }

        let mut manager = lock(ota)?;
        let result = manager.finalize();
        if result.is_err() && matches!(manager.state(), OtaState::Receiving { .. }) {
            manager.abort();
        }
        Ok(result)
    }

    /// Start the HTTP server.  Keep the returned handle alive.
    pub fn serve(ota: SharedOta) -> anyhow::Result<EspHttpServer<'static>> {
        let mut server = EspHttpServer::new(&Configuration::default())?;

        let upload = Arc::clone(&ota);
        server.fn_handler("/update", Method::Post, move |mut req| -> anyhow::Result<()> {
            let size = req
                .content_len()
                .and_then(|len| u32::try_from(len).ok());
            let Some(size) = size else {
                req.into_status_response(411)?
                    .write_all(b"Content-Length required")?;
                return Ok(());
            };

            info!("OTA: upload started ({} bytes)", size);
            match receive(&mut req, &upload, size)? {
                Ok(()) => {
                    req.into_ok_response()?.write_all(b"OK, rebooting")?;
                }
                Err(e) => {
                    warn!("OTA: upload failed: {}", e);
                    let status = match e {
                        OtaError::AlreadyInProgress => 409,
                        OtaError::InvalidSize => 413,
                        _ => 500,
                    };
                    req.into_status_response(status)?
                        .write_all(e.to_string().as_bytes())?;
                }
            }
            Ok(())
        })?;

        let status = Arc::clone(&ota);
        server.fn_handler("/update", Method::Get, move |req| -> anyhow::Result<()> {
            let body = serde_json::to_vec(&lock(&status)?.status())?;
            req.into_response(200, None, &[("Content-Type", "application/json")])?
                .write_all(&body)?;
            Ok(())
        })?;

        info!("OTA: HTTP endpoint ready at /update");
        Ok(server)
    }
}

// ── Tests ─────────────────────────────────────────────────────
