use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

/// Sending one value to the broker failed.
#[derive(Debug, Error)]
#[error("publish to {topic} failed: {reason}")]
pub struct PublishError {
    pub topic: String,
    pub reason: String,
}

/// The link to the telemetry broker that carries the outdoor probe feeds in
/// and our indoor readings out.
pub trait TelemetryChannel {
    /// Last known value per feed name (outdoor temperature, humidity,
    /// barometric pressure, probe battery charge, ...).
    fn current_values(&self) -> HashMap<String, f64>;

    /// Sends one value. Failures are reported to the caller, never retried
    /// here.
    fn publish(&self, topic: &str, value: f64) -> Result<(), PublishError>;
}

pub type TelemetryChannelPointer = Arc<dyn TelemetryChannel + Send + Sync>;
