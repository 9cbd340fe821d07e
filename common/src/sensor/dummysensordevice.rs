use super::sensordevice::{RawReading, SensorDevice};

/// Stand-in used when the real sensor cannot be opened. Reports one
/// plausible indoor reading forever, so the rest of the app runs unchanged
/// in degraded-data mode.
pub struct DummySensorDevice;

impl DummySensorDevice {
    const CANNED: RawReading = RawReading {
        temperature: 20.0,
        humidity: 42.0,
        pressure: 998.98,
        gas_resistance: 0.0,
        heat_stable: false,
    };
}

impl SensorDevice for DummySensorDevice {
    fn sample(&mut self, _gas_enabled: bool) -> Option<RawReading> {
        Some(Self::CANNED)
    }
}

#[test]
fn test_dummy_sensor_device() {
    let mut device = DummySensorDevice;
    for _ in 0..100 {
        let raw = device.sample(true).unwrap();
        assert_eq!(raw.temperature, 20.0);
        assert_eq!(raw.humidity, 42.0);
        assert_eq!(raw.pressure, 998.98);
        assert!(!raw.heat_stable);
    }
}
