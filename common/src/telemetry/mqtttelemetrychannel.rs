use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use serde::Deserialize;

use super::telemetrychannel::{PublishError, TelemetryChannel};
use crate::config::BrokerConfig;

/// How the probe firmware frames a group update: every feed of the group in
/// one JSON object, values either numbers or numeric strings.
#[derive(Deserialize)]
struct GroupMessage {
    feeds: HashMap<String, serde_json::Value>,
}

/// Live connection to the MQTT broker.
///
/// The connection event loop runs on its own thread and keeps the latest
/// feed values in a shared map; the render loop only ever reads that
/// snapshot. Reconnects are the client library's business, not ours.
pub struct MqttTelemetryChannel {
    client: Client,
    publish_prefix: String,
    values: Arc<Mutex<HashMap<String, f64>>>,
}

impl MqttTelemetryChannel {
    const KEEP_ALIVE: Duration = Duration::from_secs(60);
    /// Breather between attempts when the broker is unreachable.
    const RETRY_PAUSE: Duration = Duration::from_secs(5);

    pub fn connect(config: &BrokerConfig) -> Self {
        // A fixed client id plus a persistent session makes the broker
        // queue messages for us across reconnects.
        let (client_id, clean_session) = if config.persist {
            ("Clock_123", false)
        } else {
            ("porch-clock", true)
        };
        let port = if config.secure { 8883 } else { 1883 };

        let mut options = MqttOptions::new(client_id, config.host.as_str(), port);
        options.set_keep_alive(Self::KEEP_ALIVE);
        options.set_clean_session(clean_session);
        options.set_credentials(config.username.as_str(), config.key.as_str());
        if config.secure {
            options.set_transport(Transport::Tls(TlsConfiguration::Native));
        }

        let (client, connection) = Client::new(options, 10);
        let values = Arc::new(Mutex::new(HashMap::new()));

        let worker_client = client.clone();
        let worker_values = values.clone();
        let topic = config.subscribe_topic.clone();
        std::thread::spawn(move || {
            Self::drive(connection, worker_client, topic, worker_values);
        });

        Self {
            client,
            publish_prefix: config.publish_prefix.clone(),
            values,
        }
    }

    /// Connection event loop. Runs until the client half is dropped.
    fn drive(
        mut connection: Connection,
        client: Client,
        topic: String,
        values: Arc<Mutex<HashMap<String, f64>>>,
    ) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Resubscribe on every (re)connect.
                    log::info!("broker connected, subscribing to {topic}");
                    if let Err(e) = client.subscribe(topic.as_str(), QoS::AtMostOnce) {
                        log::warn!("subscribe to {topic} failed: {e}");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(message))) => {
                    log::debug!("broker message on {}", message.topic);
                    match parse_feeds(&message.payload) {
                        Some(feeds) => values.lock().unwrap().extend(feeds),
                        None => log::warn!("unparseable payload on {}", message.topic),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("broker connection error: {e}");
                    std::thread::sleep(Self::RETRY_PAUSE);
                }
            }
        }
    }
}

impl TelemetryChannel for MqttTelemetryChannel {
    fn current_values(&self) -> HashMap<String, f64> {
        self.values.lock().unwrap().clone()
    }

    fn publish(&self, topic: &str, value: f64) -> Result<(), PublishError> {
        let full_topic = format!("{}{}", self.publish_prefix, topic);
        self.client
            .try_publish(full_topic.as_str(), QoS::AtMostOnce, false, value.to_string())
            .map_err(|e| PublishError {
                topic: full_topic,
                reason: e.to_string(),
            })
    }
}

/// Extracts feed values from a group payload; non-numeric feeds are dropped.
fn parse_feeds(payload: &[u8]) -> Option<HashMap<String, f64>> {
    let message: GroupMessage = serde_json::from_slice(payload).ok()?;
    Some(
        message
            .feeds
            .into_iter()
            .filter_map(|(name, value)| {
                let number = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.parse().ok()))?;
                Some((name, number))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::parse_feeds;

    #[test]
    fn group_payload_with_mixed_value_types() {
        let payload = br#"{"feeds": {"alt-temp": "71.06", "battery-charge": 88.5}}"#;
        let feeds = parse_feeds(payload).unwrap();

        assert_eq!(feeds["alt-temp"], 71.06);
        assert_eq!(feeds["battery-charge"], 88.5);
    }

    #[test]
    fn junk_payload_is_rejected() {
        assert!(parse_feeds(b"ota-update-binary-blob").is_none());

        // Non-numeric feeds are dropped, numeric ones kept.
        let feeds = parse_feeds(br#"{"feeds": {"note": "windy", "pressure": 29.9}}"#).unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds["pressure"], 29.9);
    }
}
