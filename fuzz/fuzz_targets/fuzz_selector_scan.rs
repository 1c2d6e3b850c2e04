//! Fuzz target: selector scan sequences
//!
//! Each input byte is one scan: the byte is the set of held buttons and
//! the scan time advances by a fuzz-chosen step.  Verifies:
//! - No panics
//! - Skipped scans never touch the panel or publish
//! - After a reading scan the last LED frame matches the selection
//! - Commands always arrive as start/repeat pairs for the same entity
//!
//! cargo fuzz run fuzz_selector_scan

#![no_main]

use libfuzzer_sys::fuzz_target;
use playbuttons::app::ports::{CommandPublisher, PanelPort};
use playbuttons::selector::{ButtonSet, LedMask, ScanOutcome, SelectorState, step};

#[derive(Default)]
struct Panel {
    held: ButtonSet,
    frames: Vec<LedMask>,
    reads: usize,
}

impl PanelPort for Panel {
    fn read_input(&mut self, line: usize) -> bool {
        self.held.contains(line)
    }

    fn write_output(&mut self, _line: usize, _on: bool) {}

    fn read_inputs(&mut self) -> ButtonSet {
        self.reads += 1;
        self.held
    }

    fn write_outputs(&mut self, leds: LedMask) {
        self.frames.push(leds);
    }
}

#[derive(Default)]
struct Publisher(Vec<(String, String)>);

impl CommandPublisher for Publisher {
    fn publish(&mut self, command: &str, payload: &str) {
        self.0.push((command.to_string(), payload.to_string()));
    }
}

fuzz_target!(|data: &[u8]| {
    let mut state = SelectorState::new();
    let mut now = 0u64;

    for pair in data.chunks(2) {
        let held = pair[0];
        let advance = u64::from(pair.get(1).copied().unwrap_or(0)) * 100;
        now += advance;

        let mut panel = Panel {
            held: ButtonSet::from_bits(held),
            ..Panel::default()
        };
        let mut publisher = Publisher::default();
        let outcome = step(&mut state, 15_000, now, &mut panel, &mut publisher);

        match outcome {
            ScanOutcome::Skipped => {
                assert_eq!(panel.reads, 0);
                assert!(panel.frames.is_empty());
                assert!(publisher.0.is_empty());
            }
            ScanOutcome::Scanned { button, .. } => {
                assert_eq!(state.current(), button);
                if let Some(&last) = panel.frames.last() {
                    assert_eq!(last, LedMask::for_selection(button));
                }
                assert!(publisher.0.is_empty() || publisher.0.len() == 2);
                if let [start, repeat] = publisher.0.as_slice() {
                    assert_eq!(start.0, format!("playlist/{}/start", button.get()));
                    assert_eq!(repeat.0, format!("playlist/{}/repeat", button.get()));
                }
            }
        }
    }
});
