//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { cooldown_ms } => {
                info!("START | all LEDs lit | cooldown={}ms", cooldown_ms);
            }
            AppEvent::SelectionChanged { from, to } => {
                info!("SELECT | {} -> {}", from, to);
            }
            AppEvent::Triggered {
                button,
                cooldown_until_ms,
            } => {
                info!(
                    "TRIGGER | button={} | quiet until t={}ms",
                    button, cooldown_until_ms
                );
            }
        }
    }
}
