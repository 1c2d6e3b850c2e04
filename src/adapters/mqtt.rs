//! MQTT command publisher.
//!
//! Implements [`CommandPublisher`] for the show controller link.  Each
//! command becomes a QoS 0, non-retained message on
//! `{topic_prefix}/{command}`.
//!
//! Connection state is an [`AtomicBool`] written from the client's event
//! callback and read by the main loop; nothing else crosses threads.
//! Publishing while disconnected drops the message.  The client's own
//! auto-reconnect restores the link, and the next press publishes again.
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` with a callback.
//! - **other targets**: messages are recorded in an in-memory outbox.

use core::fmt::Write;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::ports::CommandPublisher;
use crate::config::{SystemConfig, TopicPrefix};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttEvent, EventPayload, MqttClientConfiguration, QoS,
};

/// Full topic: 32-byte prefix + `/` + 32-byte command name.
pub type Topic = heapless::String<72>;

/// `{prefix}/{command}`.
pub fn topic(prefix: &str, command: &str) -> Topic {
    let mut t = Topic::new();
    let _ = write!(t, "{}/{}", prefix, command);
    t
}

pub struct MqttPublisher {
    prefix: TopicPrefix,
    connected: Arc<AtomicBool>,
    published: u32,
    dropped: u32,
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    outbox: Vec<(String, String)>,
}

impl MqttPublisher {
    /// Start the client towards `config.mqtt_broker_url`.  Returns at
    /// once; the session comes up in the background.
    #[cfg(target_os = "espidf")]
    pub fn connect(
        config: &SystemConfig,
        client_id: &str,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        let connected = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&connected);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let client = EspMqttClient::new_cb(
            config.mqtt_broker_url.as_str(),
            &conf,
            move |event: EspMqttEvent<'_>| match event.payload() {
                EventPayload::Connected(_) => {
                    flag.store(true, Ordering::Release);
                    info!("MQTT: connected");
                }
                EventPayload::Disconnected => {
                    flag.store(false, Ordering::Release);
                    warn!("MQTT: disconnected");
                }
                EventPayload::Error(e) => warn!("MQTT: {:?}", e),
                _ => {}
            },
        )?;
        info!(
            "MQTT: client '{}' -> {}",
            client_id,
            config.mqtt_broker_url.as_str()
        );

        Ok(Self {
            prefix: config.mqtt_topic_prefix.clone(),
            connected,
            published: 0,
            dropped: 0,
            client,
        })
    }

    /// Simulation: an already-connected publisher with an in-memory outbox.
    #[cfg(not(target_os = "espidf"))]
    pub fn simulated(config: &SystemConfig) -> Self {
        info!("MQTT(sim): prefix '{}'", config.mqtt_topic_prefix);
        Self {
            prefix: config.mqtt_topic_prefix.clone(),
            connected: Arc::new(AtomicBool::new(true)),
            published: 0,
            dropped: 0,
            outbox: Vec::new(),
        }
    }

    /// Whether the broker session is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Handle to the connection flag (simulation drives it directly).
    pub fn connection_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.connected)
    }

    /// Messages handed to the client.
    pub fn published(&self) -> u32 {
        self.published
    }

    /// Messages dropped because the link was down or the client refused them.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Simulation: `(topic, payload)` of every message sent so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn outbox(&self) -> &[(String, String)] {
        &self.outbox
    }

    #[cfg(target_os = "espidf")]
    fn send(&mut self, topic: &str, payload: &str) -> bool {
        match self
            .client
            .enqueue(topic, QoS::AtMostOnce, false, payload.as_bytes())
        {
            Ok(_) => true,
            Err(e) => {
                warn!("MQTT: enqueue '{}' failed: {}", topic, e);
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn send(&mut self, topic: &str, payload: &str) -> bool {
        self.outbox.push((topic.to_string(), payload.to_string()));
        true
    }
}

impl CommandPublisher for MqttPublisher {
    fn publish(&mut self, command: &str, payload: &str) {
        let topic = topic(&self.prefix, command);
        if !self.is_connected() {
            self.dropped = self.dropped.saturating_add(1);
            warn!("MQTT: offline, dropped {} = {}", topic, payload);
            return;
        }
        if self.send(&topic, payload) {
            self.published = self.published.saturating_add(1);
            debug!("MQTT: {} = {}", topic, payload);
        } else {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
