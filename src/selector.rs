//! Playlist selector: the button → LED → command state machine.
//!
//! ```text
//!                 ┌──────────── cooldown active ────────────┐
//!                 │         (scan skipped entirely)         │
//!                 ▼                                         │
//!   ┌──────────────────┐   press b    ┌──────────────────┐  │
//!   │   NONE (idle)    │ ───────────▶ │   b (armed)      │ ─┘
//!   │   all LEDs lit   │ ◀─────────── │   only LED b lit │
//!   └──────────────────┘   release    └──────────────────┘
//!                                       │ press c ≠ b
//!                                       ▼ flash all, then arm c
//! ```
//!
//! All state lives in [`SelectorState`], owned by the main loop and
//! mutated only by [`step`].  Hardware and the show-controller link are
//! reached exclusively through [`PanelPort`] and [`CommandPublisher`].
//!
//! Every scan that passes the cooldown gate and reads a button as
//! pressed re-arms the cooldown and publishes the trigger sequence,
//! so a button still held when the cooldown re-opens fires again.

use core::fmt;

use log::debug;

use crate::app::commands::PlaybackCommand;
use crate::app::ports::{CommandPublisher, PanelPort};

/// Number of buttons (and indicator LEDs) on the panel.
pub const BUTTON_COUNT: usize = 8;

/// Default quiet window after a confirmed press.
pub const DEFAULT_COOLDOWN_MS: u64 = 15_000;

// ---------------------------------------------------------------------------
// Button identity
// ---------------------------------------------------------------------------

/// One-based button identifier, or [`ButtonIndex::NONE`].
///
/// Always holds a value in `0..=8`; constructors reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ButtonIndex(u8);

impl ButtonIndex {
    /// No button pressed.
    pub const NONE: Self = Self(0);

    /// Button `index` in `1..=8`.
    pub const fn new(index: u8) -> Option<Self> {
        if index >= 1 && index as usize <= BUTTON_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Button wired to zero-based expander line `line`.
    pub const fn from_line(line: usize) -> Option<Self> {
        if line < BUTTON_COUNT {
            Some(Self(line as u8 + 1))
        } else {
            None
        }
    }

    /// Raw value (`0` for [`NONE`](Self::NONE)).
    pub const fn get(self) -> u8 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Zero-based expander line, `None` for [`NONE`](Self::NONE).
    pub const fn line(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0 as usize - 1)
        }
    }
}

impl fmt::Display for ButtonIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Line sets
// ---------------------------------------------------------------------------

/// Set of button lines currently read as pressed (bit `i` = line `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Add `line` to the set.  Lines outside `0..8` are ignored.
    #[must_use]
    pub fn with(self, line: usize) -> Self {
        if line < BUTTON_COUNT {
            Self(self.0 | (1 << line))
        } else {
            self
        }
    }

    pub fn contains(self, line: usize) -> bool {
        line < BUTTON_COUNT && self.0 & (1 << line) != 0
    }

    /// Resolve to a single button: lowest index wins, empty → `NONE`.
    pub fn resolve(self) -> ButtonIndex {
        (0..BUTTON_COUNT)
            .find(|&line| self.contains(line))
            .and_then(ButtonIndex::from_line)
            .unwrap_or(ButtonIndex::NONE)
    }
}

/// Indicator LED pattern (bit `i` lit = LED of button `i + 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedMask(u8);

impl LedMask {
    /// Idle / ready pattern.
    pub const ALL: Self = Self(0xFF);
    pub const OFF: Self = Self(0x00);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The pattern that corresponds to a settled selection.
    pub fn for_selection(selection: ButtonIndex) -> Self {
        match selection.line() {
            None => Self::ALL,
            Some(line) => Self(1 << line),
        }
    }

    pub fn is_lit(self, line: usize) -> bool {
        line < BUTTON_COUNT && self.0 & (1 << line) != 0
    }
}

impl Default for LedMask {
    fn default() -> Self {
        Self::ALL
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The selector's only persistent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectorState {
    current: ButtonIndex,
    /// Monotonic deadline in ms; `None` means no cooldown has been armed.
    cooldown_until: Option<u64>,
}

impl SelectorState {
    /// Power-on state: nothing selected, cooldown in the past.
    pub const fn new() -> Self {
        Self {
            current: ButtonIndex::NONE,
            cooldown_until: None,
        }
    }

    pub fn current(&self) -> ButtonIndex {
        self.current
    }

    pub fn cooldown_until(&self) -> Option<u64> {
        self.cooldown_until
    }

    /// Whether a scan at `now_ms` is suppressed.
    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        matches!(self.cooldown_until, Some(deadline) if now_ms <= deadline)
    }

    /// LED pattern the panel shows once a scan has completed.
    pub fn leds(&self) -> LedMask {
        LedMask::for_selection(self.current)
    }
}

/// Result of a single [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Cooldown active: nothing read, nothing written, nothing published.
    Skipped,
    /// Inputs were read and the transition rule applied.
    Scanned {
        previous: ButtonIndex,
        button: ButtonIndex,
        /// The trigger sequence was published for `button`.
        triggered: bool,
    },
}

impl ScanOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Scanned { previous, button, .. } if previous != button)
    }

    pub fn triggered(&self) -> bool {
        matches!(self, Self::Scanned { triggered: true, .. })
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Drive the panel into the power-on pattern and reset `state`.
pub fn power_on(state: &mut SelectorState, panel: &mut impl PanelPort) {
    *state = SelectorState::new();
    panel.write_outputs(LedMask::ALL);
}

/// Run one scan iteration at monotonic time `now_ms`.
pub fn step(
    state: &mut SelectorState,
    cooldown_ms: u64,
    now_ms: u64,
    panel: &mut impl PanelPort,
    publisher: &mut impl CommandPublisher,
) -> ScanOutcome {
    if state.in_cooldown(now_ms) {
        return ScanOutcome::Skipped;
    }

    let button = panel.read_inputs().resolve();
    let previous = state.current;

    if button != previous {
        panel.write_outputs(LedMask::ALL);
        state.current = button;
        debug!("Selector: {} -> {}", previous, button);
    }

    if button.is_none() {
        return ScanOutcome::Scanned {
            previous,
            button,
            triggered: false,
        };
    }

    state.cooldown_until = Some(now_ms.saturating_add(cooldown_ms));
    panel.write_outputs(LedMask::for_selection(button));
    for command in PlaybackCommand::trigger_sequence(button) {
        command.publish(publisher);
    }

    ScanOutcome::Scanned {
        previous,
        button,
        triggered: true,
    }
}

// ---------------------------------------------------------------------------
// Owned wrapper
// ---------------------------------------------------------------------------

/// [`SelectorState`] bundled with its cooldown length.
pub struct Selector {
    state: SelectorState,
    cooldown_ms: u64,
}

impl Selector {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            state: SelectorState::new(),
            cooldown_ms,
        }
    }

    pub fn power_on(&mut self, panel: &mut impl PanelPort) {
        power_on(&mut self.state, panel);
    }

    pub fn scan(
        &mut self,
        now_ms: u64,
        panel: &mut impl PanelPort,
        publisher: &mut impl CommandPublisher,
    ) -> ScanOutcome {
        step(&mut self.state, self.cooldown_ms, now_ms, panel, publisher)
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}
