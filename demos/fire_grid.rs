//! A little step grid on the Akai Fire.
//!
//! Hit pads to toggle steps. Hold Shift to see the step grid cleared to a dim overlay, turn the
//! volume knob to move the bar on the display, press Play to make the play button blink.
use std::sync::mpsc;

use surfacekit::devices::fire;
use surfacekit::prelude::*;
use surfacekit::{semantic, BlinkSpeed, Context, KnobChange, Request};

struct Sequencer {
    steps: [bool; 64],
    level: u8,
    playing: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self {
            steps: [false; 64],
            level: 0,
            playing: false,
        }
    }
}

type Cx = Context<Sequencer, ()>;

struct Steps;

impl Lifecycle<Cx> for Steps {}

impl View<Cx> for Steps {
    fn on_pad(&mut self, cx: &mut Cx, index: u8, velocity: u8) {
        if velocity > 0 {
            let step = &mut cx.host.steps[index as usize];
            *step = !*step;
        }
    }

    fn draw(&mut self, cx: &mut Cx) {
        for index in 0..64 {
            let color = if cx.host.steps[index as usize] {
                semantic::PAD_HAS_CONTENT
            } else {
                semantic::OFF
            };
            cx.set_pad(index, color);
        }
    }
}

struct ShiftOverlay;

impl Lifecycle<Cx> for ShiftOverlay {}

impl View<Cx> for ShiftOverlay {
    fn draw(&mut self, cx: &mut Cx) {
        for index in 0..64 {
            cx.set_pad(index, semantic::DIM);
        }
    }
}

struct TransportMode;

impl Lifecycle<Cx> for TransportMode {}

impl Mode<Cx> for TransportMode {
    fn on_knob(&mut self, cx: &mut Cx, index: u8, change: KnobChange) {
        if let (fire::VOLUME_KNOB, KnobChange::Relative(delta)) = (index, change) {
            cx.host.level = (cx.host.level as i16 + delta as i16).max(0).min(127) as u8;
        }
    }

    fn on_button(&mut self, cx: &mut Cx, id: u8, pressed: bool) -> bool {
        match (id, pressed) {
            (fire::SHIFT, true) => cx.request(Request::TemporaryView("shift")),
            (fire::SHIFT, false) => cx.request(Request::RestoreView),
            (fire::PLAY, true) => cx.host.playing = !cx.host.playing,
            _ => return false,
        }
        true
    }

    fn draw(&mut self, cx: &mut Cx) {
        if cx.host.playing {
            let state = surfacekit::LightState::blinking(
                fire::led::DULL_GREEN,
                fire::led::HIGH_GREEN,
                BlinkSpeed::Slow,
            );
            cx.lights
                .set_desired(surfacekit::LightKey::Button(fire::PLAY), state);
        } else {
            cx.set_button_color(fire::PLAY, fire::led::OFF);
        }

        let level = cx.host.level as usize;
        if let Some(display) = &cx.display {
            display.draw(|bitmap| {
                bitmap.clear();
                for x in 0..level.min(bitmap.width()) {
                    for y in 28..36 {
                        bitmap.set(x, y, true);
                    }
                }
            });
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = fire::fire();
    let (sender, receiver) = mpsc::channel();
    let _input = surfacekit::connect_input(&config.port_keyword, sender.clone())?;
    let output = surfacekit::connect_output(&config.port_keyword)?;

    let mut surface: ControlSurface<Sequencer, ()> =
        ControlSurface::new(config, output, Sequencer::default());
    surface.views_mut().register("steps", Box::new(Steps));
    surface.views_mut().register("shift", Box::new(ShiftOverlay));
    surface.modes_mut().register("transport", Box::new(TransportMode));
    surface.views_mut().observe(|previous, view| {
        log::info!("View {:?} -> {:?}", previous, view);
    });

    surface.apply(Request::SetMode("transport"));
    surface.apply(Request::SetView("steps"));

    let stop = sender.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        println!("Press enter to quit");
        let _ = std::io::stdin().read_line(&mut line);
        let _ = stop.send(SurfaceEvent::Shutdown);
    });

    surface.spawn_tickers(sender);
    surface.run(receiver);
    Ok(())
}
