//! Peripheral drivers: port expander, status LED, task watchdog.

pub mod mcp23017;
pub mod status_led;
pub mod watchdog;
