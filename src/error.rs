//! Unified error types for the playbuttons firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! bootstrap path in `main` uniform.  All variants are `Copy`.  The
//! selector core never sees any of these: adapters absorb runtime
//! failures at the port boundary.

use core::fmt;

use crate::adapters::wifi::ConnectivityError;
use crate::app::ports::ConfigError;
use crate::drivers::mcp23017::ExpanderError;
use crate::ota::OtaError;

/// Every fallible bootstrap operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The I²C port expander could not be reached or configured.
    Expander(ExpanderError),
    /// WiFi station bring-up failed.
    Connectivity(ConnectivityError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Firmware update failed.
    Ota(OtaError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expander(e) => write!(f, "expander: {e}"),
            Self::Connectivity(e) => write!(f, "wifi: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Ota(e) => write!(f, "ota: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ExpanderError> for Error {
    fn from(e: ExpanderError) -> Self {
        Self::Expander(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<OtaError> for Error {
    fn from(e: OtaError) -> Self {
        Self::Ota(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
