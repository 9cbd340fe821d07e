mod app;
mod display;

use std::sync::{Arc, Mutex};

use porch_clock_common::config::Config;
use porch_clock_common::sensor::{DummySensorDevice, SensorDevicePointer};
use porch_clock_common::telemetry::{
    DummyTelemetryChannel, MqttTelemetryChannel, TelemetryChannelPointer,
};
use porch_clock_common::update::UpdateController;
use porch_clock_model::SharedModel;

use app::App;
use display::SdlRenderer;

#[cfg(feature = "bme680")]
fn open_sensor() -> SensorDevicePointer {
    use porch_clock_common::sensor::Bme680SensorDevice;

    match Bme680SensorDevice::open() {
        Ok(device) => Box::new(device),
        Err(e) => {
            log::warn!("{e}, falling back to simulated readings");
            Box::new(DummySensorDevice)
        }
    }
}

#[cfg(not(feature = "bme680"))]
fn open_sensor() -> SensorDevicePointer {
    log::info!("built without sensor support, using simulated readings");
    Box::new(DummySensorDevice)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("config unusable ({e}), continuing with defaults");
        Config::default()
    });

    let device = Arc::new(Mutex::new(open_sensor()));

    let channel: TelemetryChannelPointer = match &config.broker {
        Some(broker) => Arc::new(MqttTelemetryChannel::connect(broker)),
        None => {
            log::info!("no broker configured, using canned outdoor values");
            Arc::new(DummyTelemetryChannel::new()?)
        }
    };

    let model = SharedModel::default();
    let controller = UpdateController::new(device, channel.clone(), model.clone());
    let renderer = SdlRenderer::new(config.display.scale);

    let mut app = App::new(renderer, controller, channel, model);
    app.run();

    Ok(())
}
