//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::selector::ButtonIndex;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The panel has been driven to its power-on pattern.
    Started { cooldown_ms: u64 },

    /// The confirmed selection moved (including back to `NONE`).
    SelectionChanged { from: ButtonIndex, to: ButtonIndex },

    /// The trigger sequence was published for `button`.
    Triggered {
        button: ButtonIndex,
        /// Monotonic ms until which the panel ignores the buttons.
        cooldown_until_ms: u64,
    },
}
