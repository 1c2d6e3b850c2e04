//! Mock hardware adapters for integration tests.
//!
//! Record every port call so tests can assert on the full history
//! without touching a real I²C bus or broker.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use playbuttons::app::events::AppEvent;
use playbuttons::app::ports::{CommandPublisher, EventSink, PanelPort};
use playbuttons::selector::{BUTTON_COUNT, ButtonSet, LedMask};

// ── Panel call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCall {
    ReadInput(usize),
    WriteOutput { line: usize, on: bool },
    WriteOutputs(LedMask),
}

// ── MockPanel ─────────────────────────────────────────────────

/// Button lines held by the test, LEDs tracked per line.  Inputs go
/// through the trait's per-line default; full-bank writes are recorded
/// as frames.
pub struct MockPanel {
    pub pressed: ButtonSet,
    pub leds: [bool; BUTTON_COUNT],
    pub calls: Vec<PanelCall>,
}

impl MockPanel {
    pub fn new() -> Self {
        Self {
            pressed: ButtonSet::EMPTY,
            leds: [false; BUTTON_COUNT],
            calls: Vec::new(),
        }
    }

    /// Hold exactly the given one-based buttons.
    pub fn hold(&mut self, buttons: &[u8]) {
        self.pressed = buttons
            .iter()
            .fold(ButtonSet::EMPTY, |set, &b| set.with(usize::from(b) - 1));
    }

    pub fn release_all(&mut self) {
        self.pressed = ButtonSet::EMPTY;
    }

    /// Current LED state as a mask.
    pub fn lit(&self) -> LedMask {
        let bits = self
            .leds
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u8, |acc, (line, _)| acc | (1 << line));
        LedMask::from_bits(bits)
    }

    /// Full-bank LED writes in order.
    pub fn frames(&self) -> Vec<LedMask> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PanelCall::WriteOutputs(mask) => Some(*mask),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PanelCall::ReadInput(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelPort for MockPanel {
    fn read_input(&mut self, line: usize) -> bool {
        self.calls.push(PanelCall::ReadInput(line));
        self.pressed.contains(line)
    }

    fn write_output(&mut self, line: usize, on: bool) {
        self.calls.push(PanelCall::WriteOutput { line, on });
        if line < BUTTON_COUNT {
            self.leds[line] = on;
        }
    }

    fn write_outputs(&mut self, leds: LedMask) {
        self.calls.push(PanelCall::WriteOutputs(leds));
        for line in 0..BUTTON_COUNT {
            self.leds[line] = leds.is_lit(line);
        }
    }
}

// ── MockPublisher ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockPublisher {
    pub sent: Vec<(String, String)>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `playlist/N/start` commands sent.
    pub fn starts(&self) -> usize {
        self.sent.iter().filter(|(c, _)| c.ends_with("/start")).count()
    }
}

impl CommandPublisher for MockPublisher {
    fn publish(&mut self, command: &str, payload: &str) {
        self.sent.push((command.to_string(), payload.to_string()));
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── FakeExpander ──────────────────────────────────────────────

pub const EXPANDER_ADDR: u8 = 0x20;
const IODIRA: usize = 0x00;
const IODIRB: usize = 0x01;
const GPPUA: usize = 0x0C;
const GPIOA: usize = 0x12;
const OLATB: usize = 0x15;

#[derive(Debug)]
pub struct ChipState {
    pub regs: [u8; 0x16],
    pub transactions: usize,
    pub offline: bool,
}

/// MCP23017 register file behind an `embedded_hal` I²C bus.  Clones
/// share the same chip, so a test keeps a handle after the driver
/// takes ownership of the bus.
#[derive(Clone)]
pub struct FakeExpander {
    chip: Rc<RefCell<ChipState>>,
}

impl FakeExpander {
    pub fn new() -> Self {
        let mut regs = [0u8; 0x16];
        regs[IODIRA] = 0xFF;
        regs[IODIRB] = 0xFF;
        // All buttons released (pulled up).
        regs[GPIOA] = 0xFF;
        Self {
            chip: Rc::new(RefCell::new(ChipState {
                regs,
                transactions: 0,
                offline: false,
            })),
        }
    }

    /// Pull the one-based button's line low.
    pub fn press(&self, button: u8) {
        self.chip.borrow_mut().regs[GPIOA] &= !(1 << (button - 1));
    }

    pub fn release(&self, button: u8) {
        self.chip.borrow_mut().regs[GPIOA] |= 1 << (button - 1);
    }

    pub fn set_offline(&self, offline: bool) {
        self.chip.borrow_mut().offline = offline;
    }

    /// Bank B output latch.
    pub fn leds(&self) -> u8 {
        self.chip.borrow().regs[OLATB]
    }

    pub fn register(&self, index: usize) -> u8 {
        self.chip.borrow().regs[index]
    }

    pub fn pullups_a(&self) -> u8 {
        self.register(GPPUA)
    }

    pub fn direction_b(&self) -> u8 {
        self.register(IODIRB)
    }

    pub fn transactions(&self) -> usize {
        self.chip.borrow().transactions
    }
}

impl Default for FakeExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for FakeExpander {
    type Error = ErrorKind;
}

impl I2c for FakeExpander {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        if chip.offline || address != EXPANDER_ADDR {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        chip.transactions += 1;
        let mut pointer = 0usize;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&register, data)) = bytes.split_first() {
                        pointer = usize::from(register);
                        for (i, &value) in data.iter().enumerate() {
                            chip.regs[pointer + i] = value;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = chip.regs[pointer + i];
                    }
                }
            }
        }
        Ok(())
    }
}
