//! MQTT bridge for one accessory.
//!
//! Subscribes to command topics and publishes the accessory's state:
//!
//! **Subscribe Topics:**
//! - `<prefix>/target/set` - Target position `{"position": 40}` or `40`
//! - `<prefix>/hold/set` - Hold `{"hold": true}` or `true`
//! - `<prefix>/on/set` - On `{"on": true}` or `on` (switches and push-buttons)
//!
//! **Publish Topics:**
//! - `<prefix>/state` - Full state JSON, retained, on every change
//!
//! Subscriptions are renewed on every connection acknowledgement, so a
//! broker restart does not silently drop commands.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::commands::CoverEvent;
use crate::config::MqttConfig;
use crate::error::Error;

use super::api::{parse_flag_payload, parse_target_payload, PayloadError};
use super::publisher::{CoverSnapshot, SwitchSnapshot};
use super::runtime::{CoverHandle, SwitchHandle};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Configuration
// ============================================================================

/// Runtime MQTT client configuration for `rumqttc`.
///
/// Owned `String` version of [`MqttConfig`], which uses fixed-size strings.
#[derive(Debug, Clone)]
pub struct MqttRuntimeConfig {
    /// MQTT broker hostname
    pub host: String,
    /// MQTT broker port
    pub port: u16,
    /// Client ID
    pub client_id: String,
    /// Topic prefix
    pub topic_prefix: String,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Username and password, if the broker requires them
    pub credentials: Option<(String, String)>,
}

impl Default for MqttRuntimeConfig {
    fn default() -> Self {
        Self::from_config(&MqttConfig::default())
    }
}

impl MqttRuntimeConfig {
    /// Create from the daemon's [`MqttConfig`]
    pub fn from_config(config: &MqttConfig) -> Self {
        let credentials = config.has_auth().then(|| {
            (
                config.username.as_str().to_string(),
                config.password.as_str().to_string(),
            )
        });
        Self {
            host: config.host.as_str().to_string(),
            port: config.port,
            client_id: config.client_id.as_str().to_string(),
            topic_prefix: config.topic_prefix.as_str().to_string(),
            keep_alive_secs: config.keep_alive_secs,
            credentials,
        }
    }

    /// Full topic for `suffix`.
    pub fn topic(&self, suffix: &str) -> String {
        format!("{}/{}", self.topic_prefix, suffix)
    }

    /// The command part of `topic`, if it is under this prefix.
    pub fn command<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.topic_prefix.as_str())?
            .strip_prefix('/')
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs as u64));
        if let Some((username, password)) = &self.credentials {
            options.set_credentials(username, password);
        }
        options
    }
}

// ============================================================================
// Errors
// ============================================================================

/// MQTT-related errors
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The client request queue is closed
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// A command payload was rejected
    #[error("invalid payload: {0}")]
    Payload(#[from] PayloadError),
    /// The accessory did not accept the command
    #[error(transparent)]
    Accessory(#[from] Error),
    /// A message arrived on a topic with no command
    #[error("no command for topic `{0}`")]
    UnknownTopic(String),
}

impl MqttError {
    fn is_runtime_closed(&self) -> bool {
        matches!(self, MqttError::Accessory(Error::RuntimeClosed))
    }
}

// ============================================================================
// Bridges
// ============================================================================

/// An accessory reachable over MQTT.
pub trait MqttBridge: Send + 'static {
    /// Published state.
    type Snapshot: Serialize + Send + Sync + 'static;

    /// Command topic suffixes to subscribe to.
    const COMMANDS: &'static [&'static str];

    /// Apply one command message.
    fn apply(&self, command: &str, payload: &[u8]) -> Result<(), MqttError>;

    /// Receiver for the published state.
    fn subscribe(&self) -> watch::Receiver<Self::Snapshot>;
}

/// MQTT commands for a door, window or window covering.
#[derive(Clone, Debug)]
pub struct CoverBridge {
    handle: CoverHandle,
    state: watch::Receiver<CoverSnapshot>,
}

impl CoverBridge {
    /// Bridge `handle`, publishing `state`.
    pub fn new(handle: CoverHandle, state: watch::Receiver<CoverSnapshot>) -> Self {
        Self { handle, state }
    }
}

impl MqttBridge for CoverBridge {
    type Snapshot = CoverSnapshot;

    const COMMANDS: &'static [&'static str] = &["target/set", "hold/set"];

    fn apply(&self, command: &str, payload: &[u8]) -> Result<(), MqttError> {
        match command {
            "target/set" => {
                let target = parse_target_payload(payload)?;
                self.handle.send(CoverEvent::SetTargetPosition(target))?;
            }
            "hold/set" => {
                let hold = parse_flag_payload(payload, "hold")?;
                self.handle.set_hold(hold)?;
            }
            other => return Err(MqttError::UnknownTopic(other.to_string())),
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<CoverSnapshot> {
        self.state.clone()
    }
}

/// MQTT commands for a switch or push-button.
#[derive(Clone, Debug)]
pub struct SwitchBridge {
    handle: SwitchHandle,
    state: watch::Receiver<SwitchSnapshot>,
}

impl SwitchBridge {
    /// Bridge `handle`, publishing `state`.
    pub fn new(handle: SwitchHandle, state: watch::Receiver<SwitchSnapshot>) -> Self {
        Self { handle, state }
    }
}

impl MqttBridge for SwitchBridge {
    type Snapshot = SwitchSnapshot;

    const COMMANDS: &'static [&'static str] = &["on/set"];

    fn apply(&self, command: &str, payload: &[u8]) -> Result<(), MqttError> {
        match command {
            "on/set" => {
                let on = parse_flag_payload(payload, "on")?;
                self.handle.set_on(on)?;
                Ok(())
            }
            other => Err(MqttError::UnknownTopic(other.to_string())),
        }
    }

    fn subscribe(&self) -> watch::Receiver<SwitchSnapshot> {
        self.state.clone()
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Connect to the broker and bridge `bridge` until its runtime shuts down.
///
/// Connection errors are logged and retried every five seconds.
pub async fn run_mqtt<B: MqttBridge>(bridge: B, config: MqttRuntimeConfig) -> Result<(), MqttError> {
    let (client, mut eventloop) = AsyncClient::new(config.options(), 10);

    let mut state = bridge.subscribe();
    let publisher = client.clone();
    let state_topic = config.topic("state");
    let publish_task = tokio::spawn(async move {
        loop {
            let payload = serde_json::to_vec(&*state.borrow_and_update());
            match payload {
                Ok(payload) => {
                    if let Err(err) = publisher
                        .publish(state_topic.clone(), QoS::AtLeastOnce, true, payload)
                        .await
                    {
                        warn!("MQTT publish failed: {}", err);
                        break;
                    }
                }
                Err(err) => error!("failed to encode state: {}", err),
            }
            if state.changed().await.is_err() {
                break;
            }
        }
    });

    info!("MQTT connecting to {}:{}", config.host, config.port);

    let result = 'events: loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                for command in B::COMMANDS {
                    if let Err(err) = client.subscribe(config.topic(command), QoS::AtLeastOnce).await {
                        break 'events Err(err.into());
                    }
                }
                info!("MQTT connected, subscribed under `{}/`", config.topic_prefix);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Some(command) = config.command(&publish.topic) else {
                    continue;
                };
                match bridge.apply(command, &publish.payload) {
                    Ok(()) => debug!("MQTT {} accepted", publish.topic),
                    Err(err) if err.is_runtime_closed() => break 'events Ok(()),
                    Err(err) => warn!("MQTT {}: {}", publish.topic, err),
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!("MQTT error: {}", err);
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    };

    publish_task.abort();
    result
}
