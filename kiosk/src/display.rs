//! The kiosk display: an SDL window driven through the embedded-graphics
//! simulator, which maps well onto the Pi's framebuffer and keeps the
//! drawing code portable to a bare panel later.

use std::time::{Duration, Instant};

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use embedded_graphics_simulator::sdl2::Keycode;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
};
use profont::{PROFONT_12_POINT, PROFONT_14_POINT, PROFONT_18_POINT, PROFONT_24_POINT};

use porch_clock_model::{fahrenheit, inches_hg, ViewState};

/// Input the render loop cares about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Window close, ctrl-c, ...
    Quit,
    Key(char),
}

/// What the render loop needs from a display backend.
pub trait FrameRenderer {
    /// Drains whatever input arrived since the last frame.
    fn poll_input_events(&mut self) -> Vec<InputEvent>;

    /// Draws one frame into the backbuffer.
    fn draw_frame(&mut self, view: &ViewState);

    /// Puts the drawn frame on screen.
    fn present(&mut self);

    /// Sleeps away the rest of the frame budget.
    fn frame_budget_wait(&mut self, target_fps: u32);
}

/// SDL window renderer.
pub struct SdlRenderer {
    display: SimulatorDisplay<Rgb888>,
    window: Window,
    frame_started: Instant,
}

impl SdlRenderer {
    const WIDTH: u32 = 512;
    const HEIGHT: u32 = 300;

    const BGCOLOR: Rgb888 = Rgb888::new(30, 0, 40); // dark purple
    const FGCOLOR: Rgb888 = Rgb888::new(255, 255, 120); // yellow

    pub fn new(scale: u32) -> Self {
        let mut display = SimulatorDisplay::new(Size::new(Self::WIDTH, Self::HEIGHT));
        let output_settings = OutputSettingsBuilder::new().scale(scale.max(1)).build();
        let mut window = Window::new("Porch Clock", &output_settings);

        // The window only exists (and accepts events) after a first update.
        display.clear(Self::BGCOLOR).ok();
        window.update(&display);

        Self {
            display,
            window,
            frame_started: Instant::now(),
        }
    }

    fn text(&mut self, text: &str, position: Point, style: MonoTextStyle<'static, Rgb888>) {
        Text::new(text, position, style).draw(&mut self.display).ok();
    }
}

impl FrameRenderer for SdlRenderer {
    fn poll_input_events(&mut self) -> Vec<InputEvent> {
        self.window
            .events()
            .filter_map(|event| match event {
                SimulatorEvent::Quit => Some(InputEvent::Quit),
                SimulatorEvent::KeyDown {
                    keycode: Keycode::Q,
                    ..
                } => Some(InputEvent::Key('q')),
                _ => None,
            })
            .collect()
    }

    fn draw_frame(&mut self, view: &ViewState) {
        let clock = MonoTextStyle::new(&PROFONT_24_POINT, Self::FGCOLOR);
        let large = MonoTextStyle::new(&PROFONT_18_POINT, Self::FGCOLOR);
        let medium = MonoTextStyle::new(&PROFONT_14_POINT, Self::FGCOLOR);
        let small = MonoTextStyle::new(&PROFONT_12_POINT, Self::FGCOLOR);

        self.display.clear(Self::BGCOLOR).ok();

        self.text(&view.time_text, Point::new(40, 60), clock);
        self.text(&view.date_text, Point::new(110, 140), medium);

        // Outdoor block: probe values as they arrive over the broker, in
        // display units already (the probe publishes °F and in-Hg).
        let outdoor = |name: &str| view.outdoor.get(name).copied().unwrap_or_default();
        self.text("Outdoor:", Point::new(55, 195), small);
        self.text(
            &format!("{:.0}°F", outdoor("alt-temp")),
            Point::new(50, 230),
            large,
        );
        self.text(
            &format!("Hum:  {:.0} %", outdoor("alt-humidity")),
            Point::new(300, 195),
            small,
        );
        self.text(
            &format!("Bar:  {:.1} in", outdoor("pressure")),
            Point::new(300, 220),
            small,
        );
        self.text(
            &format!("Bat:  {:.0} %", outdoor("battery-charge")),
            Point::new(300, 245),
            small,
        );

        // Indoor block appears once the first sampling cycle has finished.
        if let Some(indoor) = &view.indoor {
            self.text(
                &format!(
                    "Indoor:  {:.0}°F   {:.0} %   {:.2} in   {:.0} kOhm",
                    fahrenheit(indoor.temperature),
                    indoor.humidity,
                    inches_hg(indoor.pressure),
                    indoor.gas_resistance / 1000.0
                ),
                Point::new(55, 280),
                small,
            );
        }

        let pad = 5;
        Rectangle::new(
            Point::new(pad, pad),
            Size::new(Self::WIDTH - 2 * pad as u32, Self::HEIGHT - 2 * pad as u32),
        )
        .into_styled(PrimitiveStyle::with_stroke(Self::FGCOLOR, 1))
        .draw(&mut self.display)
        .ok();
    }

    fn present(&mut self) {
        self.window.update(&self.display);
    }

    fn frame_budget_wait(&mut self, target_fps: u32) {
        let budget = Duration::from_secs(1) / target_fps.max(1);
        let elapsed = self.frame_started.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
        self.frame_started = Instant::now();
    }
}
