//! Full stack on a simulated MCP23017: AppService → ExpanderPanel →
//! driver → I²C register file.

use crate::mock_hw::{EXPANDER_ADDR, FakeExpander, LogSink, MockPublisher};

use playbuttons::adapters::panel::ExpanderPanel;
use playbuttons::app::ports::PanelPort;
use playbuttons::app::service::AppService;
use playbuttons::config::SystemConfig;
use playbuttons::drivers::mcp23017::{ExpanderError, Mcp23017};
use playbuttons::selector::{ButtonIndex, ButtonSet, LedMask};

fn panel() -> (ExpanderPanel<FakeExpander>, FakeExpander) {
    let chip = FakeExpander::new();
    let panel = ExpanderPanel::new(Mcp23017::new(chip.clone(), EXPANDER_ADDR)).unwrap();
    (panel, chip)
}

#[test]
fn configures_banks_on_construction() {
    let (_panel, chip) = panel();
    assert_eq!(chip.pullups_a(), 0xFF);
    assert_eq!(chip.direction_b(), 0x00);
    assert_eq!(chip.leds(), 0xFF);
}

#[test]
fn missing_expander_fails_construction() {
    let chip = FakeExpander::new();
    let result = ExpanderPanel::new(Mcp23017::new(chip, 0x21));
    assert!(matches!(result, Err(ExpanderError::Nack)));
}

#[test]
fn inputs_are_active_low() {
    let (mut panel, chip) = panel();
    chip.press(2);
    chip.press(7);

    assert_eq!(panel.read_inputs(), ButtonSet::EMPTY.with(1).with(6));
    assert!(panel.read_input(1));
    assert!(!panel.read_input(0));
}

#[test]
fn bank_read_is_one_transaction() {
    let (mut panel, chip) = panel();
    let before = chip.transactions();
    panel.read_inputs();
    assert_eq!(chip.transactions(), before + 1);
}

#[test]
fn single_line_write_uses_shadow_latch() {
    let (mut panel, chip) = panel();
    panel.write_output(3, false);
    assert_eq!(chip.leds(), 0b1111_0111);
    panel.write_output(3, true);
    assert_eq!(chip.leds(), 0xFF);
}

#[test]
fn bus_failure_reads_as_nothing_pressed() {
    let (mut panel, chip) = panel();
    chip.press(1);
    chip.set_offline(true);

    assert_eq!(panel.read_inputs(), ButtonSet::EMPTY);
    panel.write_outputs(LedMask::OFF);
    assert_eq!(panel.bus_errors(), 2);
    assert_eq!(chip.leds(), 0xFF);
}

#[test]
fn press_drives_expander_leds_end_to_end() {
    let (mut panel, chip) = panel();
    let mut app = AppService::new(&SystemConfig::default());
    let mut mqtt = MockPublisher::new();
    let mut sink = LogSink::new();

    app.start(&mut panel, &mut sink);
    assert_eq!(chip.leds(), 0xFF);

    chip.press(4);
    app.tick(10, &mut panel, &mut mqtt, &mut sink);
    assert_eq!(chip.leds(), 0b0000_1000);
    assert_eq!(app.selection(), ButtonIndex::new(4).unwrap());

    chip.release(4);
    app.tick(15_020, &mut panel, &mut mqtt, &mut sink);
    assert_eq!(chip.leds(), 0xFF);
    assert_eq!(mqtt.starts(), 1);
}
