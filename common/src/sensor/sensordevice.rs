use std::sync::{Arc, Mutex};

use thiserror::Error;

/// One raw readout from the environmental sensor, in native units
/// (°C, %RH, hPa, Ohms).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
    /// Whether the gas hot plate had reached its target temperature when
    /// this readout was taken. Gas resistance is meaningless until it has.
    pub heat_stable: bool,
}

/// The sensor could not be opened at startup.
#[derive(Debug, Error)]
#[error("sensor device unavailable: {0}")]
pub struct DeviceError(pub String);

/// The environmental sensor, physical or simulated.
pub trait SensorDevice {
    /// Takes one reading. `gas_enabled` selects whether the gas heater
    /// profile is active for this readout. Returns `None` on a bus or read
    /// error; callers skip the sample rather than retry.
    fn sample(&mut self, gas_enabled: bool) -> Option<RawReading>;
}

pub type SensorDevicePointer = Box<dyn SensorDevice + Send>;

pub type SensorDeviceSharedPointer = Arc<Mutex<SensorDevicePointer>>;
