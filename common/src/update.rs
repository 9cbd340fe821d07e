//! Starts sensor update cycles and delivers their results.
//!
//! The render loop ticks the controller every frame; every five minutes the
//! controller puts one sampling cycle plus one completion task on the
//! runner. While a cycle is in flight further ticks do nothing, so there is
//! never more than one cycle running and a late cycle is skipped rather
//! than queued.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use porch_clock_model::{Reading, SharedModel};

use crate::sampling::{CycleConfig, SamplingCycle};
use crate::sensor::SensorDeviceSharedPointer;
use crate::tasks::{Step, Task, TaskRunner};
use crate::telemetry::TelemetryChannelPointer;
use crate::ValueStore;

/// Feed names the indoor reading is published under, in sensor-native
/// units. The probe firmware on the other end of the broker uses the same
/// scheme.
const PUBLISH_TOPICS: [&str; 4] = [
    "indoor-temperature",
    "indoor-humidity",
    "indoor-pressure",
    "indoor-voc",
];

struct ControllerState {
    /// `None` until the first cycle has run; the first tick fires right
    /// away.
    next_due: Option<Instant>,
    in_flight: bool,
}

/// Decides when a new sampling cycle starts and hands finished readings to
/// the model and the telemetry channel.
pub struct UpdateController {
    device: SensorDeviceSharedPointer,
    channel: TelemetryChannelPointer,
    model: SharedModel,
    cycle: CycleConfig,
    interval: Duration,
    state: Arc<Mutex<ControllerState>>,
}

impl UpdateController {
    pub const UPDATE_INTERVAL: Duration = Duration::from_secs(300);

    pub fn new(
        device: SensorDeviceSharedPointer,
        channel: TelemetryChannelPointer,
        model: SharedModel,
    ) -> Self {
        Self {
            device,
            channel,
            model,
            cycle: CycleConfig::default(),
            interval: Self::UPDATE_INTERVAL,
            state: Arc::new(Mutex::new(ControllerState {
                next_due: None,
                in_flight: false,
            })),
        }
    }

    /// Overrides the default cycle and update timing.
    pub fn with_timing(mut self, cycle: CycleConfig, interval: Duration) -> Self {
        self.cycle = cycle;
        self.interval = interval;
        self
    }

    /// Spawns a new cycle if one is due and none is in flight. Called once
    /// per frame.
    pub fn tick(&self, now: Instant, runner: &mut TaskRunner) {
        let mut state = self.state.lock().unwrap();
        if state.in_flight || state.next_due.is_some_and(|due| now < due) {
            return;
        }
        state.in_flight = true;
        log::info!("starting sensor update cycle");

        let result = ValueStore::default();
        runner.spawn(SamplingCycle::new(
            self.device.clone(),
            self.cycle,
            result.clone(),
        ));
        runner.spawn(DeliverResult {
            result,
            channel: self.channel.clone(),
            model: self.model.clone(),
            state: self.state.clone(),
            interval: self.interval,
        });
    }
}

/// Completion half of an update cycle: waits for the sampling task's
/// reading, then publishes it and re-arms the controller.
struct DeliverResult {
    result: ValueStore<Reading>,
    channel: TelemetryChannelPointer,
    model: SharedModel,
    state: Arc<Mutex<ControllerState>>,
    interval: Duration,
}

impl Task for DeliverResult {
    fn step(&mut self, now: Instant) -> Step {
        let Some(reading) = self.result.get() else {
            return Step::Wait;
        };

        self.model.set_indoor(reading);

        let values = [
            reading.temperature,
            reading.humidity,
            reading.pressure,
            reading.gas_resistance,
        ];
        for (topic, value) in PUBLISH_TOPICS.into_iter().zip(values) {
            // One failed feed must not keep the others from going out.
            if let Err(e) = self.channel.publish(topic, value) {
                log::warn!("{e}");
            }
        }

        let mut state = self.state.lock().unwrap();
        state.in_flight = false;
        state.next_due = Some(now + self.interval);
        Step::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{DummySensorDevice, SensorDevicePointer};
    use crate::telemetry::{PublishError, TelemetryChannel};
    use std::collections::HashMap;

    /// Records publish attempts; optionally fails one topic.
    struct RecordingChannel {
        published: Mutex<Vec<(String, f64)>>,
        fail_topic: Option<&'static str>,
    }

    impl RecordingChannel {
        fn new(fail_topic: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                published: Mutex::new(Vec::new()),
                fail_topic,
            })
        }
    }

    impl TelemetryChannel for RecordingChannel {
        fn current_values(&self) -> HashMap<String, f64> {
            HashMap::new()
        }

        fn publish(&self, topic: &str, value: f64) -> Result<(), PublishError> {
            if self.fail_topic == Some(topic) {
                return Err(PublishError {
                    topic: topic.into(),
                    reason: "stub says no".into(),
                });
            }
            self.published.lock().unwrap().push((topic.into(), value));
            Ok(())
        }
    }

    fn controller(
        channel: Arc<RecordingChannel>,
        model: SharedModel,
    ) -> UpdateController {
        let device: SensorDevicePointer = Box::new(DummySensorDevice);
        UpdateController::new(Arc::new(Mutex::new(device)), channel, model).with_timing(
            CycleConfig {
                samples: 1,
                sample_interval: Duration::ZERO,
                heater_settle: Duration::ZERO,
            },
            Duration::from_secs(300),
        )
    }

    fn drain(runner: &mut TaskRunner, now: Instant) {
        for _ in 0..100 {
            if runner.is_empty() {
                return;
            }
            runner.step_all(now);
        }
        panic!("runner did not drain");
    }

    #[test]
    fn immediate_second_tick_spawns_nothing() {
        let controller = controller(RecordingChannel::new(None), SharedModel::default());
        let mut runner = TaskRunner::new();
        let now = Instant::now();

        controller.tick(now, &mut runner);
        // One cycle and its completion task.
        assert_eq!(runner.len(), 2);

        controller.tick(now, &mut runner);
        assert_eq!(runner.len(), 2);
    }

    #[test]
    fn completed_cycle_updates_model_and_publishes() {
        let channel = RecordingChannel::new(None);
        let model = SharedModel::default();
        let controller = controller(channel.clone(), model.clone());
        let mut runner = TaskRunner::new();
        let now = Instant::now();

        controller.tick(now, &mut runner);
        drain(&mut runner, now);

        // The dummy device reports 20 °C and never heat-stable gas.
        let reading = model.indoor().unwrap();
        assert_eq!(reading.temperature, 20.0);
        assert_eq!(reading.gas_resistance, 0.0);

        let published = channel.published.lock().unwrap();
        let topics: Vec<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "indoor-temperature",
                "indoor-humidity",
                "indoor-pressure",
                "indoor-voc"
            ]
        );
    }

    #[test]
    fn one_failed_publish_does_not_stop_the_rest() {
        let channel = RecordingChannel::new(Some("indoor-humidity"));
        let controller = controller(channel.clone(), SharedModel::default());
        let mut runner = TaskRunner::new();
        let now = Instant::now();

        controller.tick(now, &mut runner);
        drain(&mut runner, now);

        let published = channel.published.lock().unwrap();
        let topics: Vec<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(
            topics,
            vec!["indoor-temperature", "indoor-pressure", "indoor-voc"]
        );
    }

    #[test]
    fn next_cycle_waits_for_the_update_interval() {
        let controller = controller(RecordingChannel::new(None), SharedModel::default());
        let mut runner = TaskRunner::new();
        let t0 = Instant::now();

        controller.tick(t0, &mut runner);
        drain(&mut runner, t0);

        // Just finished: not due again yet.
        controller.tick(t0 + Duration::from_secs(1), &mut runner);
        assert!(runner.is_empty());

        controller.tick(t0 + Duration::from_secs(301), &mut runner);
        assert_eq!(runner.len(), 2);
    }
}
