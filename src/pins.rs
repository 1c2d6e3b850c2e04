//! GPIO / bus assignments for the button panel board.
//!
//! Single source of truth: every driver references this module rather
//! than hard-coding pin numbers.  `main` picks the matching typed pins
//! from `esp_idf_hal::peripherals::Pins` and pins them to these numbers
//! with a compile-time assertion.

// ---------------------------------------------------------------------------
// I²C bus (MCP23017 port expander)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Standard-mode bus clock.
pub const I2C_BAUD_HZ: u32 = 100_000;

/// MCP23017 7-bit address with A0–A2 strapped low.
pub const EXPANDER_ADDRESS: u8 = 0x20;

// ---------------------------------------------------------------------------
// Expander line mapping
// ---------------------------------------------------------------------------
//
// Bank A (expander pins 0–7): push-buttons 1–8, active-low, pulled up.
// Bank B (expander pins 8–15): indicator LEDs 1–8, HIGH = lit.

/// Expander pin of button line 0.
pub const BUTTON_PIN_BASE: u8 = 0;
/// Expander pin of LED line 0.
pub const LED_PIN_BASE: u8 = 8;

// ---------------------------------------------------------------------------
// On-board status LED
// ---------------------------------------------------------------------------

/// Active-high on-board LED; lit while booting.
pub const STATUS_LED_GPIO: i32 = 2;
