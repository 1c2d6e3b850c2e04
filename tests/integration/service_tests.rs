//! AppService orchestration: events, counters, wire topics.

use crate::mock_hw::{LogSink, MockPanel, MockPublisher};

use playbuttons::adapters::mqtt::MqttPublisher;
use playbuttons::app::events::AppEvent;
use playbuttons::app::service::AppService;
use playbuttons::config::{SystemConfig, bounded};
use playbuttons::selector::{ButtonIndex, LedMask};

fn make_app() -> (AppService, MockPanel, LogSink) {
    let mut app = AppService::new(&SystemConfig::default());
    let mut panel = MockPanel::new();
    let mut sink = LogSink::new();
    app.start(&mut panel, &mut sink);
    (app, panel, sink)
}

#[test]
fn start_emits_started_and_lights_panel() {
    let (app, panel, sink) = make_app();

    assert_eq!(panel.lit(), LedMask::ALL);
    assert_eq!(
        sink.events,
        vec![AppEvent::Started {
            cooldown_ms: 15_000
        }]
    );
    assert_eq!(app.selection(), ButtonIndex::NONE);
}

#[test]
fn press_and_release_emit_selection_events() {
    let (mut app, mut panel, mut sink) = make_app();
    let mut mqtt = MockPublisher::new();
    let three = ButtonIndex::new(3).unwrap();

    panel.hold(&[3]);
    app.tick(1_000, &mut panel, &mut mqtt, &mut sink);
    panel.release_all();
    app.tick(16_001, &mut panel, &mut mqtt, &mut sink);

    assert_eq!(
        &sink.events[1..],
        &[
            AppEvent::SelectionChanged {
                from: ButtonIndex::NONE,
                to: three,
            },
            AppEvent::Triggered {
                button: three,
                cooldown_until_ms: 16_000,
            },
            AppEvent::SelectionChanged {
                from: three,
                to: ButtonIndex::NONE,
            },
        ]
    );
    assert_eq!(app.trigger_count(), 1);
    assert_eq!(app.scan_count(), 2);
}

#[test]
fn cooldown_suppresses_scans_entirely() {
    let (mut app, mut panel, mut sink) = make_app();
    let mut mqtt = MockPublisher::new();

    panel.hold(&[1]);
    app.tick(0, &mut panel, &mut mqtt, &mut sink);
    panel.clear();

    for t in (10..=15_000).step_by(10) {
        app.tick(t, &mut panel, &mut mqtt, &mut sink);
    }

    assert!(panel.calls.is_empty());
    assert_eq!(mqtt.starts(), 1);
    assert_eq!(app.scan_count(), 1);
}

#[test]
fn publishes_on_prefixed_topics_through_mqtt_adapter() {
    let config = SystemConfig {
        mqtt_topic_prefix: bounded("theatre"),
        ..SystemConfig::default()
    };
    let mut app = AppService::new(&config);
    let mut panel = MockPanel::new();
    let mut sink = LogSink::new();
    let mut mqtt = MqttPublisher::simulated(&config);

    app.start(&mut panel, &mut sink);
    panel.hold(&[5]);
    app.tick(0, &mut panel, &mut mqtt, &mut sink);

    assert_eq!(
        mqtt.outbox(),
        &[
            ("theatre/playlist/5/start".to_string(), "1".to_string()),
            ("theatre/playlist/5/repeat".to_string(), "1".to_string()),
        ]
    );
}

#[test]
fn offline_broker_does_not_disturb_selection() {
    let config = SystemConfig::default();
    let mut app = AppService::new(&config);
    let mut panel = MockPanel::new();
    let mut sink = LogSink::new();
    let mut mqtt = MqttPublisher::simulated(&config);
    mqtt.connection_flag()
        .store(false, std::sync::atomic::Ordering::Release);

    app.start(&mut panel, &mut sink);
    panel.hold(&[2]);
    app.tick(0, &mut panel, &mut mqtt, &mut sink);

    assert_eq!(app.selection(), ButtonIndex::new(2).unwrap());
    assert!(app.in_cooldown(1));
    assert!(mqtt.outbox().is_empty());
    assert_eq!(mqtt.dropped(), 2);
}
