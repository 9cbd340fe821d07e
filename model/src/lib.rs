use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One averaged indoor measurement, in sensor-native units
/// (°C, %RH, hPa, Ohms).
///
/// Produced once per completed sampling cycle and replaced wholesale by the
/// next cycle's reading.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    pub time_text: String,
    pub date_text: String,
    pub indoor: Option<Reading>,
    /// Last known values per feed name (outdoor probe, battery, ...).
    pub outdoor: HashMap<String, f64>,
}

/// Latest indoor reading, written by the update controller when a cycle
/// finishes and read by the render loop every frame.
#[derive(Clone, Default)]
pub struct SharedModel(Arc<Mutex<Option<Reading>>>);

impl SharedModel {
    /// Replaces the indoor reading.
    ///
    /// # Panics
    ///
    /// If locking the internally used mutex fails.
    pub fn set_indoor(&self, reading: Reading) {
        *self.0.lock().unwrap() = Some(reading);
    }

    /// The latest indoor reading, `None` until the first cycle completes.
    pub fn indoor(&self) -> Option<Reading> {
        *self.0.lock().unwrap()
    }
}

/// Current time and date as display strings, e.g. `" 3:04 pm"` and
/// `"Tuesday, December  7, 2024"`.
pub fn clock_strings(now: DateTime<Local>) -> (String, String) {
    let time = now.format("%l:%M %P").to_string();
    let date = now.format("%A, %B %e, %Y").to_string();
    (time, date)
}

pub fn fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// hPa to inches of mercury.
pub fn inches_hg(hectopascal: f64) -> f64 {
    // 1 in-Hg = 33.8638864 hPa
    hectopascal / 33.8638864
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clock_strings_follow_kiosk_format() {
        let now = Local.with_ymd_and_hms(2024, 12, 3, 15, 4, 0).unwrap();
        let (time, date) = clock_strings(now);
        assert_eq!(time.trim_start(), "3:04 pm");
        assert_eq!(date, "Tuesday, December  3, 2024");
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(fahrenheit(20.0), 68.0);
        assert!((inches_hg(1013.25) - 29.92).abs() < 0.01);
    }

    #[test]
    fn shared_model_keeps_latest_reading() {
        let model = SharedModel::default();
        assert_eq!(model.indoor(), None);

        model.set_indoor(Reading {
            temperature: 21.5,
            ..Reading::default()
        });
        model.set_indoor(Reading {
            temperature: 22.0,
            ..Reading::default()
        });

        // Reads do not consume; both observers see the same latest value.
        assert_eq!(model.indoor().unwrap().temperature, 22.0);
        assert_eq!(model.indoor().unwrap().temperature, 22.0);
    }
}
