//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for the playlist panel: the selector
//! orchestration, the outbound playback commands, and the structured
//! events the core reports.  All interaction with hardware and the
//! network happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
