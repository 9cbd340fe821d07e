use std::collections::HashMap;

use serde::Deserialize;

use super::telemetrychannel::{PublishError, TelemetryChannel};

/// Stands in for the broker when none is configured. Serves one canned set
/// of outdoor values and swallows publishes, so the rest of the app runs
/// unchanged.
#[derive(Deserialize)]
pub struct DummyTelemetryChannel {
    feeds: HashMap<String, f64>,
}

impl DummyTelemetryChannel {
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummytelemetry.json");

        serde_json::from_str::<Self>(json_data)
    }
}

impl TelemetryChannel for DummyTelemetryChannel {
    fn current_values(&self) -> HashMap<String, f64> {
        self.feeds.clone()
    }

    fn publish(&self, topic: &str, value: f64) -> Result<(), PublishError> {
        log::info!("no broker configured, dropping publish of {topic} = {value}");
        Ok(())
    }
}

#[test]
fn test_dummy_telemetry_channel() {
    let channel = DummyTelemetryChannel::new().unwrap();
    let values = channel.current_values();

    assert_eq!(values["alt-temp"], 68.0);
    assert_eq!(values["battery-charge"], 84.0);
    assert!(channel.publish("indoor-temperature", 21.3).is_ok());
}
