//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (expander panel, MQTT publisher, event sinks, NVS)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! Panel and publisher ports are infallible by contract: adapters absorb
//! bus and transport errors (log + fallback) before they reach the core.

use crate::config::SystemConfig;
use crate::selector::{BUTTON_COUNT, ButtonSet, LedMask};

// ───────────────────────────────────────────────────────────────
// Panel port (driven adapter: buttons + indicator LEDs)
// ───────────────────────────────────────────────────────────────

/// Eight button inputs and eight indicator outputs, addressed by
/// zero-based line `0..8`.
pub trait PanelPort {
    /// `true` when the button on `line` is held down.
    fn read_input(&mut self, line: usize) -> bool;

    /// Light (`on = true`) or extinguish the LED on `line`.
    fn write_output(&mut self, line: usize, on: bool);

    /// Read every button line.  Adapters with a bank-wide register
    /// should override this with a single bus transaction.
    fn read_inputs(&mut self) -> ButtonSet {
        (0..BUTTON_COUNT)
            .filter(|&line| self.read_input(line))
            .fold(ButtonSet::EMPTY, ButtonSet::with)
    }

    /// Drive all eight LEDs to `leds`.
    fn write_outputs(&mut self, leds: LedMask) {
        for line in 0..BUTTON_COUNT {
            self.write_output(line, leds.is_lit(line));
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Command publisher port (driven adapter: domain → show controller)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget named command channel to the show controller.
///
/// No acknowledgement is returned; delivery and reconnection are the
/// adapter's responsibility.
pub trait CommandPublisher {
    fn publish(&mut self, command: &str, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Serialized config exceeds the storage blob limit.
    TooLarge,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::TooLarge => write!(f, "config blob too large"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
