mod sensordevice;
mod dummysensordevice;

pub use sensordevice::DeviceError;
pub use sensordevice::RawReading;
pub use sensordevice::SensorDevice;
pub use sensordevice::SensorDevicePointer;
pub use sensordevice::SensorDeviceSharedPointer;

pub use dummysensordevice::DummySensorDevice;

#[cfg(feature = "bme680")]
mod bme680sensordevice;

#[cfg(feature = "bme680")]
pub use bme680sensordevice::Bme680SensorDevice;
