//! Selector transition rule against the per-line panel port.

use crate::mock_hw::{MockPanel, MockPublisher, PanelCall};

use playbuttons::selector::{
    BUTTON_COUNT, ButtonIndex, LedMask, ScanOutcome, SelectorState, power_on, step,
};

const COOLDOWN: u64 = 15_000;

fn b(n: u8) -> ButtonIndex {
    ButtonIndex::new(n).unwrap()
}

fn boot() -> (SelectorState, MockPanel, MockPublisher) {
    let mut state = SelectorState::new();
    let mut panel = MockPanel::new();
    power_on(&mut state, &mut panel);
    panel.clear();
    (state, panel, MockPublisher::new())
}

#[test]
fn power_on_lights_everything_and_publishes_nothing() {
    let mut state = SelectorState::new();
    let mut panel = MockPanel::new();
    power_on(&mut state, &mut panel);

    assert_eq!(panel.lit(), LedMask::ALL);
    assert_eq!(state.current(), ButtonIndex::NONE);
    assert_eq!(state.cooldown_until(), None);
    assert_eq!(panel.reads(), 0);
}

#[test]
fn scan_reads_every_line_once() {
    let (mut state, mut panel, mut mqtt) = boot();
    step(&mut state, COOLDOWN, 0, &mut panel, &mut mqtt);

    let lines: Vec<usize> = panel
        .calls
        .iter()
        .filter_map(|c| match c {
            PanelCall::ReadInput(line) => Some(*line),
            _ => None,
        })
        .collect();
    assert_eq!(lines, (0..BUTTON_COUNT).collect::<Vec<_>>());
}

#[test]
fn idle_scan_with_nothing_pressed_changes_nothing() {
    let (mut state, mut panel, mut mqtt) = boot();
    let outcome = step(&mut state, COOLDOWN, 0, &mut panel, &mut mqtt);

    assert!(!outcome.changed());
    assert!(panel.frames().is_empty());
    assert!(mqtt.sent.is_empty());
}

#[test]
fn press_lights_single_led_and_publishes_pair() {
    let (mut state, mut panel, mut mqtt) = boot();
    panel.hold(&[6]);
    step(&mut state, COOLDOWN, 500, &mut panel, &mut mqtt);

    assert_eq!(panel.frames(), vec![LedMask::ALL, LedMask::from_bits(1 << 5)]);
    assert_eq!(
        mqtt.sent,
        vec![
            ("playlist/6/start".to_string(), "1".to_string()),
            ("playlist/6/repeat".to_string(), "1".to_string()),
        ]
    );
    assert_eq!(state.cooldown_until(), Some(15_500));
}

#[test]
fn release_returns_to_idle_pattern() {
    let (mut state, mut panel, mut mqtt) = boot();
    panel.hold(&[2]);
    step(&mut state, COOLDOWN, 0, &mut panel, &mut mqtt);
    panel.release_all();

    let outcome = step(&mut state, COOLDOWN, 15_001, &mut panel, &mut mqtt);

    assert_eq!(
        outcome,
        ScanOutcome::Scanned {
            previous: b(2),
            button: ButtonIndex::NONE,
            triggered: false,
        }
    );
    assert_eq!(panel.lit(), LedMask::ALL);
    assert_eq!(state.current(), ButtonIndex::NONE);
    assert_eq!(mqtt.starts(), 1);
}

#[test]
fn deadline_itself_is_still_cooldown() {
    let (mut state, mut panel, mut mqtt) = boot();
    panel.hold(&[1]);
    step(&mut state, COOLDOWN, 100, &mut panel, &mut mqtt);
    panel.clear();

    assert_eq!(
        step(&mut state, COOLDOWN, 15_100, &mut panel, &mut mqtt),
        ScanOutcome::Skipped
    );
    assert!(panel.calls.is_empty());
    assert!(step(&mut state, COOLDOWN, 15_101, &mut panel, &mut mqtt).triggered());
}

#[test]
fn simultaneous_presses_pick_lowest() {
    let (mut state, mut panel, mut mqtt) = boot();
    panel.hold(&[8, 4, 7]);
    step(&mut state, COOLDOWN, 0, &mut panel, &mut mqtt);

    assert_eq!(state.current(), b(4));
    assert_eq!(mqtt.sent[0].0, "playlist/4/start");
}

#[test]
fn switching_buttons_flashes_all_before_new_led() {
    let (mut state, mut panel, mut mqtt) = boot();
    panel.hold(&[1]);
    step(&mut state, COOLDOWN, 0, &mut panel, &mut mqtt);
    panel.hold(&[8]);
    panel.clear();

    step(&mut state, COOLDOWN, 20_000, &mut panel, &mut mqtt);

    assert_eq!(panel.frames(), vec![LedMask::ALL, LedMask::from_bits(0x80)]);
    assert_eq!(state.current(), b(8));
}
