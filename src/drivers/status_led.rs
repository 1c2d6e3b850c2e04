//! On-board status LED.
//!
//! A single active-high GPIO.  Lit from power-up until the panel is
//! ready, then switched off.
//!
//! On ESP-IDF: raw GPIO writes.  On host/test: tracks state in-memory only.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct StatusLed {
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    gpio: i32,
    lit: bool,
}

impl StatusLed {
    /// Configure `gpio` as an output, initially off.
    pub fn new(gpio: i32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: single-owner pin, configured once at boot.
            unsafe {
                gpio_reset_pin(gpio);
                gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_OUTPUT);
                gpio_set_level(gpio, 0);
            }
        }
        Self { gpio, lit: false }
    }

    pub fn set(&mut self, on: bool) {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: output register write on a pin we configured.
            unsafe {
                gpio_set_level(self.gpio, u32::from(on));
            }
        }
        self.lit = on;
    }

    pub fn on(&mut self) {
        self.set(true);
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
