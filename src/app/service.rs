//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the [`Selector`] and the panel's counters.  It
//! exposes a hardware-agnostic API; all I/O flows through port traits
//! injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!   PanelPort ◀──▶ ┌────────────────────────┐ ──▶ EventSink
//!                  │       AppService       │
//!                  │   Selector · cooldown  │ ──▶ CommandPublisher
//!                  └────────────────────────┘
//! ```

use log::info;

use crate::config::SystemConfig;
use crate::selector::{ButtonIndex, ScanOutcome, Selector, SelectorState};

use super::events::AppEvent;
use super::ports::{CommandPublisher, EventSink, PanelPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    selector: Selector,
    scan_count: u64,
    trigger_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch the panel; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            selector: Selector::new(u64::from(config.cooldown_ms)),
            scan_count: 0,
            trigger_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the power-on pattern (all LEDs lit, nothing selected).
    /// Publishes nothing.
    pub fn start(&mut self, panel: &mut impl PanelPort, sink: &mut impl EventSink) {
        self.selector.power_on(panel);
        sink.emit(&AppEvent::Started {
            cooldown_ms: self.selector.cooldown_ms(),
        });
        info!(
            "AppService started (cooldown {} ms)",
            self.selector.cooldown_ms()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration of the selector at monotonic `now_ms`.
    ///
    /// Never blocks beyond the panel's bus transactions.
    pub fn tick(
        &mut self,
        now_ms: u64,
        panel: &mut impl PanelPort,
        publisher: &mut impl CommandPublisher,
        sink: &mut impl EventSink,
    ) -> ScanOutcome {
        let outcome = self.selector.scan(now_ms, panel, publisher);

        if let ScanOutcome::Scanned {
            previous,
            button,
            triggered,
        } = outcome
        {
            self.scan_count += 1;

            if previous != button {
                sink.emit(&AppEvent::SelectionChanged {
                    from: previous,
                    to: button,
                });
            }

            if triggered {
                self.trigger_count += 1;
                sink.emit(&AppEvent::Triggered {
                    button,
                    cooldown_until_ms: self
                        .selector
                        .state()
                        .cooldown_until()
                        .unwrap_or(now_ms),
                });
            }
        }

        outcome
    }

    // ── Queries ───────────────────────────────────────────────

    /// Currently confirmed selection.
    pub fn selection(&self) -> ButtonIndex {
        self.selector.state().current()
    }

    pub fn state(&self) -> &SelectorState {
        self.selector.state()
    }

    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        self.selector.state().in_cooldown(now_ms)
    }

    /// Scans that actually read the panel (cooldown skips excluded).
    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    /// Trigger sequences published since startup.
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }
}
