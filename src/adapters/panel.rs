//! Expander-backed button panel.
//!
//! Implements [`PanelPort`] over the [`Mcp23017`] driver: buttons on
//! bank A (active-low, so a pressed button reads `0`), LEDs on bank B.
//! Bus failures never reach the core.  A failed read reports "nothing
//! pressed", a failed write is dropped, and both bump an error counter.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::PanelPort;
use crate::drivers::mcp23017::{ExpanderError, Mcp23017};
use crate::pins;
use crate::selector::{BUTTON_COUNT, ButtonSet, LedMask};

pub struct ExpanderPanel<I2C> {
    expander: Mcp23017<I2C>,
    bus_errors: u32,
}

impl<I2C: I2c> ExpanderPanel<I2C> {
    /// Configure the expander banks and take ownership of it.
    pub fn new(mut expander: Mcp23017<I2C>) -> Result<Self, ExpanderError> {
        expander.configure_panel()?;
        info!(
            "Panel: {} buttons on expander pins {}-{}, LEDs on {}-{}",
            BUTTON_COUNT,
            pins::BUTTON_PIN_BASE,
            pins::BUTTON_PIN_BASE as usize + BUTTON_COUNT - 1,
            pins::LED_PIN_BASE,
            pins::LED_PIN_BASE as usize + BUTTON_COUNT - 1,
        );
        Ok(Self {
            expander,
            bus_errors: 0,
        })
    }

    /// Bus transactions that failed since construction.
    pub fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    pub fn expander(&self) -> &Mcp23017<I2C> {
        &self.expander
    }

    /// Log the 1st, 2nd, 4th, 8th... failure so a dead bus does not
    /// flood the console at scan rate.
    fn record_error(&mut self, op: &str, e: ExpanderError) {
        self.bus_errors = self.bus_errors.saturating_add(1);
        if self.bus_errors.is_power_of_two() {
            warn!("Panel: {} failed: {} ({} errors so far)", op, e, self.bus_errors);
        }
    }
}

impl<I2C: I2c> PanelPort for ExpanderPanel<I2C> {
    fn read_input(&mut self, line: usize) -> bool {
        self.read_inputs().contains(line)
    }

    fn write_output(&mut self, line: usize, on: bool) {
        let Ok(line) = u8::try_from(line) else {
            return;
        };
        if let Err(e) = self.expander.set_output(line, on) {
            self.record_error("LED write", e);
        }
    }

    fn read_inputs(&mut self) -> ButtonSet {
        match self.expander.read_bank_a() {
            Ok(levels) => ButtonSet::from_bits(!levels),
            Err(e) => {
                self.record_error("button read", e);
                ButtonSet::EMPTY
            }
        }
    }

    fn write_outputs(&mut self, leds: LedMask) {
        if let Err(e) = self.expander.write_bank_b(leds.bits()) {
            self.record_error("LED write", e);
        }
    }
}
