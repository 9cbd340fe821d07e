//! The multi-phase sensor sampling cycle.
//!
//! One cycle reads the sensor for roughly a minute: an ambient phase with
//! the gas heater off, a settle pause so the hot plate can reach its
//! plateau, then a gas phase with the heater on. The cycle is a [`Task`]
//! state machine, so the render loop keeps its cadence while a cycle is in
//! flight.

use std::time::{Duration, Instant};

use porch_clock_model::Reading;

use crate::sensor::SensorDeviceSharedPointer;
use crate::tasks::{Step, Task};
use crate::ValueStore;

/// Timing and sample-count knobs for one cycle.
#[derive(Clone, Copy, Debug)]
pub struct CycleConfig {
    /// How many settled samples per field make it into the averages.
    /// The ambient phase takes twice this many, the gas phase three times.
    pub samples: usize,
    /// Delay between consecutive raw samples within a phase.
    pub sample_interval: Duration,
    /// Pause between the ambient and gas phases, so the heater reaches a
    /// valid plateau without biasing the ambient readings.
    pub heater_settle: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            samples: 5,
            sample_interval: Duration::from_secs(2),
            heater_settle: Duration::from_secs(20),
        }
    }
}

/// Raw scalars collected during the current cycle, one list per field.
/// Fresh per cycle; only the running cycle ever touches it.
#[derive(Default)]
struct SampleBuffer {
    temperature: Vec<f64>,
    humidity: Vec<f64>,
    pressure: Vec<f64>,
    gas_resistance: Vec<f64>,
}

enum Phase {
    /// Heater off; collecting temperature, humidity and pressure.
    Ambient { taken: usize },
    /// Heater on; collecting gas resistance once the plate is stable.
    Gas { taken: usize },
}

/// One sampling cycle, driven step by step by the task runner.
///
/// The finished [`Reading`] lands in the result slot handed to [`new`],
/// where the completion task picks it up.
///
/// [`new`]: SamplingCycle::new
pub struct SamplingCycle {
    device: SensorDeviceSharedPointer,
    config: CycleConfig,
    result: ValueStore<Reading>,
    phase: Phase,
    buffer: SampleBuffer,
}

impl SamplingCycle {
    pub fn new(
        device: SensorDeviceSharedPointer,
        config: CycleConfig,
        result: ValueStore<Reading>,
    ) -> Self {
        Self {
            device,
            config,
            result,
            phase: Phase::Ambient { taken: 0 },
            buffer: SampleBuffer::default(),
        }
    }

    /// Mean of the last `n` values of `field`. Early samples are taken while
    /// the sensor is still settling, so they are deliberately left out.
    fn tail_mean(values: &[f64], n: usize, field: &str) -> f64 {
        let tail = &values[values.len().saturating_sub(n)..];
        if tail.is_empty() {
            log::warn!("no valid {field} samples this cycle, reporting 0");
            return 0.0;
        }
        tail.iter().sum::<f64>() / tail.len() as f64
    }

    fn finish(&mut self) -> Reading {
        let n = self.config.samples;
        let reading = Reading {
            temperature: Self::tail_mean(&self.buffer.temperature, n, "temperature"),
            humidity: Self::tail_mean(&self.buffer.humidity, n, "humidity"),
            pressure: Self::tail_mean(&self.buffer.pressure, n, "pressure"),
            gas_resistance: Self::tail_mean(&self.buffer.gas_resistance, n, "gas resistance"),
        };
        log::info!(
            "cycle done: {:.1} °C, {:.1} %RH, {:.1} hPa, {:.0} Ohms",
            reading.temperature,
            reading.humidity,
            reading.pressure,
            reading.gas_resistance
        );
        reading
    }
}

impl Task for SamplingCycle {
    fn step(&mut self, now: Instant) -> Step {
        match self.phase {
            Phase::Ambient { taken } => {
                // A failed read is skipped, never retried; the phase still
                // uses up one of its attempts.
                if let Some(raw) = self.device.lock().unwrap().sample(false) {
                    self.buffer.temperature.push(raw.temperature);
                    self.buffer.humidity.push(raw.humidity);
                    self.buffer.pressure.push(raw.pressure);
                } else {
                    log::debug!("ambient sample {taken} failed, skipping");
                }
                let taken = taken + 1;
                if taken < 2 * self.config.samples {
                    self.phase = Phase::Ambient { taken };
                    Step::Sleep(now + self.config.sample_interval)
                } else {
                    self.phase = Phase::Gas { taken: 0 };
                    Step::Sleep(now + self.config.heater_settle)
                }
            }
            Phase::Gas { taken } => {
                match self.device.lock().unwrap().sample(true) {
                    // Gas resistance is garbage until the hot plate reports
                    // stable, so those readouts are dropped too.
                    Some(raw) if raw.heat_stable => {
                        self.buffer.gas_resistance.push(raw.gas_resistance);
                    }
                    Some(_) => log::debug!("gas sample {taken} not heat-stable, skipping"),
                    None => log::debug!("gas sample {taken} failed, skipping"),
                }
                let taken = taken + 1;
                if taken < 3 * self.config.samples {
                    self.phase = Phase::Gas { taken };
                    Step::Sleep(now + self.config.sample_interval)
                } else {
                    let reading = self.finish();
                    self.result.set(reading);
                    Step::Done
                }
            }
        }
    }
}
