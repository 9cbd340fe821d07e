mod telemetrychannel;
mod dummytelemetrychannel;
mod mqtttelemetrychannel;

pub use telemetrychannel::PublishError;
pub use telemetrychannel::TelemetryChannel;
pub use telemetrychannel::TelemetryChannelPointer;

pub use dummytelemetrychannel::DummyTelemetryChannel;

pub use mqtttelemetrychannel::MqttTelemetryChannel;
