use std::time::Duration;

use bme680::{
    Bme680, I2CAddress, IIRFilterSize, OversamplingSetting, PowerMode, SettingsBuilder,
};
use linux_embedded_hal::{Delay, I2cdev};

use super::sensordevice::{DeviceError, RawReading, SensorDevice};

/// Bosch BME680 on the Raspberry Pi I2C bus (wired via StemmaQT, so it sits
/// at the secondary address).
pub struct Bme680SensorDevice {
    sensor: Bme680<I2cdev, Delay>,
    delay: Delay,
    gas_enabled: bool,
}

impl Bme680SensorDevice {
    const BUS: &'static str = "/dev/i2c-1";

    /// Added to the temperature in °C before it is reported, compensating
    /// for board self-heating.
    const TEMP_OFFSET: f32 = -2.7;

    /// Heater profile from the burn-in measurements: 320 °C for 900 ms.
    const HEATER_TEMPERATURE: u16 = 320;
    const HEATER_DURATION: Duration = Duration::from_millis(900);

    pub fn open() -> Result<Self, DeviceError> {
        let i2c = I2cdev::new(Self::BUS).map_err(|e| DeviceError(e.to_string()))?;
        let mut delay = Delay {};
        let mut sensor = Bme680::init(i2c, &mut delay, I2CAddress::Secondary)
            .map_err(|e| DeviceError(format!("{e:?}")))?;
        sensor
            .set_sensor_settings(&mut delay, Self::settings(false))
            .map_err(|e| DeviceError(format!("{e:?}")))?;
        log::info!("BME680 opened on {}", Self::BUS);
        Ok(Self {
            sensor,
            delay,
            gas_enabled: false,
        })
    }

    fn settings(gas_enabled: bool) -> bme680::Settings {
        SettingsBuilder::new()
            .with_humidity_oversampling(OversamplingSetting::OS2x)
            .with_pressure_oversampling(OversamplingSetting::OS4x)
            .with_temperature_oversampling(OversamplingSetting::OS8x)
            .with_temperature_filter(IIRFilterSize::Size3)
            .with_temperature_offset(Self::TEMP_OFFSET)
            .with_gas_measurement(Self::HEATER_DURATION, Self::HEATER_TEMPERATURE, 20)
            .with_run_gas(gas_enabled)
            .build()
    }
}

impl SensorDevice for Bme680SensorDevice {
    fn sample(&mut self, gas_enabled: bool) -> Option<RawReading> {
        if gas_enabled != self.gas_enabled {
            if let Err(e) = self
                .sensor
                .set_sensor_settings(&mut self.delay, Self::settings(gas_enabled))
            {
                log::debug!("sensor reconfigure failed: {e:?}");
                return None;
            }
            self.gas_enabled = gas_enabled;
        }

        // Forced mode: one conversion per trigger, then back to sleep.
        if let Err(e) = self
            .sensor
            .set_sensor_mode(&mut self.delay, PowerMode::ForcedMode)
        {
            log::debug!("sensor trigger failed: {e:?}");
            return None;
        }

        match self.sensor.get_sensor_data(&mut self.delay) {
            Ok((data, _state)) => Some(RawReading {
                temperature: f64::from(data.temperature_celsius()),
                humidity: f64::from(data.humidity_percent()),
                pressure: f64::from(data.pressure_hpa()),
                gas_resistance: f64::from(data.gas_resistance_ohm()),
                heat_stable: data.heat_stable(),
            }),
            Err(e) => {
                log::debug!("sensor read failed: {e:?}");
                None
            }
        }
    }
}
