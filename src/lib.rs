/*!
A generic runtime for MIDI control surfaces: pad grids, buttons, encoders and small monochrome
displays, driven from a host application's object model.

A device is described by a [`SurfaceConfig`]: how its pads are numbered on the wire, which
messages its buttons and knobs send, how its LEDs are lit and which colors it knows. The
[`ControlSurface`] takes such a description plus a [`Transport`] and does the rest: it diffs the
lights so only what changed is sent, emulates blinking with a software clock, packs the display
bitmap into the device's SysEx stripes (and resends them before the device blanks itself), and
routes input to the active [`state::View`] and [`state::Mode`].

```no_run
use std::sync::mpsc;
use surfacekit::prelude::*;
use surfacekit::{devices, Context, Request};

struct Paint;
impl Lifecycle<Context<(), u8>> for Paint {}
impl View<Context<(), u8>> for Paint {
    fn on_pad(&mut self, cx: &mut Context<(), u8>, index: u8, velocity: u8) {
        if velocity > 0 {
            cx.set_pad(index, surfacekit::semantic::SELECTED);
        }
    }
}

let config = devices::launchpad::mini_mk3();
let (sender, receiver) = mpsc::channel();
let _input = surfacekit::connect_input(&config.port_keyword, sender.clone())?;
let output = surfacekit::connect_output(&config.port_keyword)?;

let mut surface: ControlSurface<(), u8> = ControlSurface::new(config, output, ());
surface.views_mut().register("paint", Box::new(Paint));
surface.apply(Request::SetView("paint"));
surface.spawn_tickers(sender);
surface.run(receiver);
# Ok::<(), surfacekit::MidiError>(())
```

# Lights

Views write the desired state of each light into the [`LightStore`] of their [`Context`], by
semantic color name where possible ([`semantic`]). Writing is cheap and idempotent; after each
event the store hands out only the lights whose effective color changed, and the device's
[`PadProtocol`] batches them into as few messages as the hardware allows.

# Displays

Renderers draw into a [`SharedDisplay`], from any thread. With the `embedded-graphics` feature the
[`Bitmap`] behind it is a `DrawTarget`.
*/

pub mod util;

pub mod protocols;
pub use protocols::{LedAddressing, PadProtocol};

pub mod state;

pub mod devices;

mod errors;
pub use errors::*;

mod midi_io;
pub use midi_io::*;

mod timer;
pub use timer::*;

mod color;
pub use color::*;

mod addressing;
pub use addressing::*;

mod lights;
pub use lights::*;

mod display;
pub use display::*;

pub mod surface;
pub use surface::*;

pub mod prelude {
    pub use crate::state::{Lifecycle, Mode, View};
    pub use crate::surface::{ControlSurface, SurfaceEvent};
    pub use crate::{CoordinateTranslator, Transport};
}

/// Identifier used for e.g. the midi port names etc.
const APPLICATION_NAME: &str = "surfacekit";
