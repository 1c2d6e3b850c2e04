//! MCP23017 16-bit I²C port expander driver.
//!
//! Register-level driver over any [`embedded_hal::i2c::I2c`] bus.  The
//! panel uses the chip in its power-on register layout (`IOCON.BANK = 0`)
//! with a fixed split:
//!
//! | Bank | Expander pins | Direction | Use                         |
//! |------|---------------|-----------|-----------------------------|
//! | A    | 0–7           | input     | buttons, weak pull-up       |
//! | B    | 8–15          | output    | indicator LEDs (HIGH = lit) |
//!
//! Bank B writes go to `OLATB`.  The driver keeps a shadow of the latch
//! so a single-line change costs one bus transaction instead of a
//! read-modify-write.

use core::fmt;

use embedded_hal::i2c::{ErrorKind, I2c};

/// Register addresses (IOCON.BANK = 0).
pub mod reg {
    pub const IODIRA: u8 = 0x00;
    pub const IODIRB: u8 = 0x01;
    pub const IPOLA: u8 = 0x02;
    pub const IOCON: u8 = 0x0A;
    pub const GPPUA: u8 = 0x0C;
    pub const GPIOA: u8 = 0x12;
    pub const OLATB: u8 = 0x15;
}

/// Lines per bank.
pub const BANK_WIDTH: u8 = 8;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpanderError {
    /// The expander did not acknowledge its address or a data byte.
    Nack,
    /// Any other bus-level failure (arbitration, overrun, timeout...).
    Bus,
    /// Line index outside `0..8`.
    InvalidLine(u8),
}

impl ExpanderError {
    fn from_bus(e: &impl embedded_hal::i2c::Error) -> Self {
        match e.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            _ => Self::Bus,
        }
    }
}

impl fmt::Display for ExpanderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "I2C NACK from expander"),
            Self::Bus => write!(f, "I2C bus error"),
            Self::InvalidLine(line) => write!(f, "expander line {} out of range", line),
        }
    }
}

// ── Driver ────────────────────────────────────────────────────

pub struct Mcp23017<I2C> {
    i2c: I2C,
    address: u8,
    /// Last value written to OLATB.
    olat_b: u8,
}

impl<I2C: I2c> Mcp23017<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            olat_b: 0xFF,
        }
    }

    /// One-time setup: bank A inputs with pull-ups, bank B outputs
    /// latched HIGH (all LEDs lit) before the direction switch so the
    /// LEDs never flicker off during boot.
    pub fn configure_panel(&mut self) -> Result<(), ExpanderError> {
        self.write_register(reg::IOCON, 0x00)?;
        self.write_register(reg::IODIRA, 0xFF)?;
        self.write_register(reg::IPOLA, 0x00)?;
        self.write_register(reg::GPPUA, 0xFF)?;
        self.write_register(reg::OLATB, 0xFF)?;
        self.write_register(reg::IODIRB, 0x00)?;
        self.olat_b = 0xFF;
        Ok(())
    }

    /// Raw bank A levels (bit set = line HIGH = button released).
    pub fn read_bank_a(&mut self) -> Result<u8, ExpanderError> {
        self.read_register(reg::GPIOA)
    }

    /// Latch all eight bank B outputs.
    pub fn write_bank_b(&mut self, value: u8) -> Result<(), ExpanderError> {
        self.write_register(reg::OLATB, value)?;
        self.olat_b = value;
        Ok(())
    }

    /// Drive a single bank B line; no bus traffic if it already holds `high`.
    pub fn set_output(&mut self, line: u8, high: bool) -> Result<(), ExpanderError> {
        if line >= BANK_WIDTH {
            return Err(ExpanderError::InvalidLine(line));
        }
        let value = if high {
            self.olat_b | (1 << line)
        } else {
            self.olat_b & !(1 << line)
        };
        if value == self.olat_b {
            return Ok(());
        }
        self.write_bank_b(value)
    }

    /// Shadow of the bank B output latch.
    pub fn output_latch(&self) -> u8 {
        self.olat_b
    }

    /// Give the bus back (tests, bus sharing).
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), ExpanderError> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(|e| ExpanderError::from_bus(&e))
    }

    fn read_register(&mut self, register: u8) -> Result<u8, ExpanderError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(|e| ExpanderError::from_bus(&e))?;
        Ok(buf[0])
    }
}
