//! The fixed-cadence application loop.

use std::time::Instant;

use porch_clock_common::tasks::TaskRunner;
use porch_clock_common::telemetry::TelemetryChannelPointer;
use porch_clock_common::update::UpdateController;
use porch_clock_model::{clock_strings, SharedModel, ViewState};

use crate::display::{FrameRenderer, InputEvent};

/// Owns the renderer, the update controller and the background task runner,
/// and drives all three from one loop. Background work only ever advances
/// inside [`TaskRunner::step_all`], so nothing here blocks on the sensor or
/// the network.
pub struct App<R: FrameRenderer> {
    renderer: R,
    controller: UpdateController,
    channel: TelemetryChannelPointer,
    model: SharedModel,
    runner: TaskRunner,
    running: bool,
}

impl<R: FrameRenderer> App<R> {
    /// Waiting much longer than 100 ms per frame makes the quit key feel
    /// sluggish.
    const TARGET_FPS: u32 = 10;

    pub fn new(
        renderer: R,
        controller: UpdateController,
        channel: TelemetryChannelPointer,
        model: SharedModel,
    ) -> Self {
        Self {
            renderer,
            controller,
            channel,
            model,
            runner: TaskRunner::new(),
            running: true,
        }
    }

    /// Runs until a quit event or the `q` key. An in-flight sampling cycle
    /// is dropped with the runner on the way out; nothing waits for it.
    pub fn run(&mut self) {
        while self.running {
            for event in self.renderer.poll_input_events() {
                self.on_event(event);
            }

            let now = Instant::now();
            self.controller.tick(now, &mut self.runner);
            self.runner.step_all(now);

            let view = self.view_state();
            self.renderer.draw_frame(&view);
            self.renderer.present();
            self.renderer.frame_budget_wait(Self::TARGET_FPS);
        }
        log::info!("shutting down");
    }

    fn on_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit | InputEvent::Key('q') => self.running = false,
            InputEvent::Key(_) => {}
        }
    }

    fn view_state(&self) -> ViewState {
        let (time_text, date_text) = clock_strings(chrono::Local::now());
        ViewState {
            time_text,
            date_text,
            indoor: self.model.indoor(),
            outdoor: self.channel.current_values(),
        }
    }
}
