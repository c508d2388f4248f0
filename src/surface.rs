//! The control surface runtime: one owner for the light store, the mode and view managers and the
//! transport, fed by a single event queue.
//!
//! MIDI input, blink ticks, display keep-alive ticks and host redraw requests all arrive as
//! [`SurfaceEvent`]s on one channel, from whatever thread produces them. [`ControlSurface::run`]
//! handles them one at a time, so nothing in here ever needs a lock except the display buffer,
//! which renderers may share (see [`SharedDisplay`]).

use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use crate::protocols::{self, sysex, DeviceIdQuery, DeviceInquiry, PadProtocol, PadUpdate};
use crate::state::{ModeManager, ViewManager};
use crate::{
    BlinkClock, BlinkSpeed, ButtonId, ColorRegistry, ConfigError, ControlMap,
    CoordinateTranslator, InputEvent, LightKey, LightState, LightStore, PaletteIndex, Rgb,
    SharedDisplay, StripeLayout, Ticker, Transport,
};

/// Mode and view ids
pub type StateId = &'static str;

/// How many transitions requested from hooks are applied in a row before the rest are dropped.
/// A longer chain is almost certainly two states requesting each other.
pub const MAX_CHAINED_REQUESTS: usize = 16;

/// Everything needed to drive one piece of hardware. Built once, usually by one of the
/// [`crate::devices`] functions, and never changed afterwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceConfig {
    pub name: Cow<'static, str>,
    /// Part of the MIDI port name, used to find the device
    pub port_keyword: Cow<'static, str>,
    pub controls: ControlMap,
    pub pad_protocol: PadProtocol,
    pub colors: ColorRegistry,
    pub display: Option<StripeLayout>,
    /// Slow blinks toggle once per period, fast blinks twice
    pub blink_period: Duration,
    /// Sent when the surface starts, e.g. to switch the device into a controllable mode
    pub greeting: Vec<Cow<'static, [u8]>>,
    /// Sent last on shutdown
    pub goodbye: Vec<Cow<'static, [u8]>>,
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controls.validate()?;
        self.pad_protocol.validate()?;
        if let Some(display) = &self.display {
            display.validate()?;
        }
        for frame in self.greeting.iter().chain(&self.goodbye) {
            match frame.split_first() {
                Some((&sysex::SYSEX_START, rest)) => {
                    let body = rest.strip_suffix(&[sysex::SYSEX_END]).unwrap_or(rest);
                    sysex::check_data(body)?;
                }
                Some((_, data)) => sysex::check_data(data)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Decode a raw MIDI message from this device
    pub fn decode(&self, data: &[u8]) -> Option<InputEvent> {
        self.controls.decode(data)
    }
}

/// What the event loop reacts to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    /// Raw bytes from the device
    Midi(Vec<u8>),
    /// Half a blink period passed
    BlinkTick,
    /// Time to check whether display stripes need a keep-alive resend
    DisplayRefresh,
    /// Host state changed; draw everything again
    Redraw,
    /// Forget what the hardware shows and send everything again
    Resync,
    Shutdown,
}

/// A state change asked for from inside a hook or handler. Applied once the current event has
/// been handled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request<K> {
    SetMode(StateId),
    TemporaryMode(StateId),
    RestoreMode,
    SetView(StateId),
    TemporaryView(StateId),
    RestoreView,
    SwitchContext(K),
}

/// What modes and views get to work with.
///
/// `host` is whatever object model the application exposes (tracks, transport, ...). Lights are
/// written by semantic color where possible so views stay device independent.
pub struct Context<H, K> {
    pub host: H,
    pub lights: LightStore<LightKey>,
    pub colors: ColorRegistry,
    pub display: Option<SharedDisplay>,
    requests: VecDeque<Request<K>>,
}

impl<H, K> Context<H, K> {
    fn new(host: H, colors: ColorRegistry, display: Option<SharedDisplay>) -> Self {
        Self {
            host,
            lights: LightStore::new(),
            colors,
            display,
            requests: VecDeque::new(),
        }
    }

    /// Queue a mode/view change. It takes effect after the current event has been handled.
    pub fn request(&mut self, request: Request<K>) {
        self.requests.push_back(request);
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn color(&self, semantic: &str) -> PaletteIndex {
        self.colors.resolve(semantic)
    }

    pub fn set_pad(&mut self, index: u8, semantic: &str) {
        let color = self.color(semantic);
        self.lights.set_color(LightKey::Pad(index), color);
    }

    pub fn set_pad_color(&mut self, index: u8, color: PaletteIndex) {
        self.lights.set_color(LightKey::Pad(index), color);
    }

    pub fn set_pad_blinking(&mut self, index: u8, semantic: &str, blink: &str, speed: BlinkSpeed) {
        let state = LightState::blinking(self.color(semantic), self.color(blink), speed);
        self.lights.set_desired(LightKey::Pad(index), state);
    }

    pub fn set_button(&mut self, id: ButtonId, semantic: &str) {
        let color = self.color(semantic);
        self.lights.set_color(LightKey::Button(id), color);
    }

    pub fn set_button_color(&mut self, id: ButtonId, color: PaletteIndex) {
        self.lights.set_color(LightKey::Button(id), color);
    }
}

/// One connected control surface.
///
/// ```
/// use surfacekit::{devices, ControlSurface, MockTransport, SurfaceEvent};
///
/// let transport = MockTransport::new();
/// let mut surface: ControlSurface<(), u8> =
///     ControlSurface::new(devices::launchpad::mini_mk3(), transport.clone(), ());
/// surface.start();
///
/// surface.context_mut().set_pad_color(0, 5);
/// surface.handle(SurfaceEvent::Redraw);
/// // Launchpads take their colors batched into SysEx
/// assert!(transport.sent().contains(&vec![240, 0, 32, 41, 2, 13, 3, 0, 81, 5, 247]));
/// ```
pub struct ControlSurface<H, K> {
    // Declared first so the tickers are dropped before the transport
    tickers: Vec<Ticker>,
    config: SurfaceConfig,
    transport: Box<dyn Transport>,
    cx: Context<H, K>,
    modes: ModeManager<StateId, Context<H, K>>,
    views: ViewManager<StateId, K, Context<H, K>>,
    identity: Option<DeviceInquiry>,
    shut_down: bool,
}

impl<H, K> ControlSurface<H, K>
where
    K: Clone + Eq + Hash + Debug,
{
    pub fn new(config: SurfaceConfig, transport: impl Transport + 'static, host: H) -> Self {
        if let Err(e) = config.validate() {
            log::error!("Configuration of {} is broken: {}", config.name, e);
        }

        let display = config.display.clone().map(SharedDisplay::new);
        let cx = Context::new(host, config.colors.clone(), display);
        Self {
            config,
            transport: Box::new(transport),
            cx,
            modes: ModeManager::new(),
            views: ViewManager::new(),
            tickers: Vec::new(),
            identity: None,
            shut_down: false,
        }
    }

    /// Greet the device, ask who it is and bring it in line with the current state
    pub fn start(&mut self) {
        log::debug!("Starting {}", self.config.name);
        let greeting = self.config.greeting.clone();
        for frame in &greeting {
            self.send(frame);
        }
        let inquiry = protocols::device_inquiry_message(DeviceIdQuery::Any);
        self.send(&inquiry);

        self.resync();
    }

    /// Start the blink clock and, if there's a display, the keep-alive clock. Both post their
    /// ticks into `events`.
    pub fn spawn_tickers(&mut self, events: Sender<SurfaceEvent>) {
        let blink = events.clone();
        self.tickers.push(Ticker::start(
            BlinkClock::tick_period(self.config.blink_period),
            move || blink.send(SurfaceEvent::BlinkTick).is_ok(),
        ));

        if let Some(display) = &self.cx.display {
            let period = display.layout().keep_alive / 4;
            display.set_refresh_margin(period);
            self.tickers.push(Ticker::start(period, move || {
                events.send(SurfaceEvent::DisplayRefresh).is_ok()
            }));
        }
    }

    /// Handle events until the channel closes or a [`SurfaceEvent::Shutdown`] arrives, then shut
    /// down.
    pub fn run(&mut self, events: Receiver<SurfaceEvent>) {
        self.start();
        for event in events.iter() {
            if !self.handle(event) {
                break;
            }
        }
        self.shutdown();
    }

    /// Handle one event. Returns false once the surface has shut down.
    pub fn handle(&mut self, event: SurfaceEvent) -> bool {
        if self.shut_down {
            log::trace!("Ignoring {:?} after shutdown", event);
            return false;
        }

        match event {
            SurfaceEvent::Midi(data) => {
                self.handle_midi(&data);
                self.process_requests();
                self.redraw();
            }
            SurfaceEvent::BlinkTick => {
                self.cx.lights.blink_tick();
                self.flush_lights();
            }
            SurfaceEvent::DisplayRefresh => self.flush_display(),
            SurfaceEvent::Redraw => self.redraw(),
            SurfaceEvent::Resync => self.resync(),
            SurfaceEvent::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Apply a state change from outside any hook, then redraw
    pub fn apply(&mut self, request: Request<K>) {
        self.cx.request(request);
        self.process_requests();
        self.redraw();
    }

    fn handle_midi(&mut self, data: &[u8]) {
        if data.first() == Some(&sysex::SYSEX_START) {
            match protocols::parse_device_query(data) {
                Some(identity) => {
                    log::info!("{} identified itself as {:?}", self.config.name, identity);
                    self.identity = Some(identity);
                }
                None => log::trace!("Ignoring SysEx {:02X?}", data),
            }
            return;
        }

        let event = match self.config.decode(data) {
            Some(event) => event,
            None => {
                log::trace!("Ignoring {:02X?}", data);
                return;
            }
        };
        self.dispatch(event);
    }

    /// Route a decoded input: pads to the view, knobs to the mode, buttons to the view first and
    /// then to the mode.
    pub fn dispatch(&mut self, event: InputEvent) {
        let cx = &mut self.cx;
        match event {
            InputEvent::Pad { index, velocity } => {
                if let Some(view) = self.views.active_view() {
                    view.on_pad(cx, index, velocity);
                }
            }
            InputEvent::Button { id, pressed } => {
                let handled = match self.views.active_view() {
                    Some(view) => view.on_button(cx, id, pressed),
                    None => false,
                };
                let handled = handled
                    || match self.modes.active_mode() {
                        Some(mode) => mode.on_button(cx, id, pressed),
                        None => false,
                    };
                if !handled {
                    log::trace!("Nobody wants button {} (pressed: {})", id, pressed);
                }
            }
            InputEvent::Knob { index, change } => {
                if let Some(mode) = self.modes.active_mode() {
                    mode.on_knob(cx, index, change);
                }
            }
            InputEvent::KnobTouch { index, touched } => {
                if let Some(mode) = self.modes.active_mode() {
                    mode.on_knob_touch(cx, index, touched);
                }
            }
        }
    }

    /// Apply queued requests, including the ones the resulting hooks queue
    fn process_requests(&mut self) {
        let mut applied = 0;
        while let Some(request) = self.cx.requests.pop_front() {
            if applied == MAX_CHAINED_REQUESTS {
                log::warn!(
                    "Dropping {:?} and {} more requests, transitions keep requesting transitions",
                    request,
                    self.cx.requests.len()
                );
                self.cx.requests.clear();
                break;
            }
            applied += 1;

            let cx = &mut self.cx;
            match request {
                Request::SetMode(id) => self.modes.set_active(id, cx),
                Request::TemporaryMode(id) => self.modes.set_temporary(id, cx),
                Request::RestoreMode => self.modes.restore_previous(cx),
                Request::SetView(id) => self.views.set_active(id, cx),
                Request::TemporaryView(id) => self.views.set_temporary(id, cx),
                Request::RestoreView => self.views.restore_previous(cx),
                Request::SwitchContext(key) => self.views.switch_context(key, cx),
            };
        }
    }

    /// Let the active view and mode draw, then send what changed
    pub fn redraw(&mut self) {
        let cx = &mut self.cx;
        if let Some(view) = self.views.active_view() {
            view.draw(cx);
        }
        if let Some(mode) = self.modes.active_mode() {
            mode.draw(cx);
        }
        // Drawing may request transitions too
        if !self.cx.requests.is_empty() {
            self.process_requests();
        }
        self.flush();
    }

    /// Forget everything the hardware was sent and send it all again
    pub fn resync(&mut self) {
        self.cx.lights.invalidate();
        if let Some(display) = &self.cx.display {
            display.invalidate();
        }
        self.redraw();
    }
}

impl<H, K> ControlSurface<H, K> {
    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn context(&self) -> &Context<H, K> {
        &self.cx
    }

    pub fn context_mut(&mut self) -> &mut Context<H, K> {
        &mut self.cx
    }

    pub fn host(&self) -> &H {
        &self.cx.host
    }

    pub fn modes(&self) -> &ModeManager<StateId, Context<H, K>> {
        &self.modes
    }

    /// For registering modes and observers. Switch modes through [`ControlSurface::apply`].
    pub fn modes_mut(&mut self) -> &mut ModeManager<StateId, Context<H, K>> {
        &mut self.modes
    }

    pub fn views(&self) -> &ViewManager<StateId, K, Context<H, K>> {
        &self.views
    }

    /// For registering views and observers. Switch views through [`ControlSurface::apply`].
    pub fn views_mut(&mut self) -> &mut ViewManager<StateId, K, Context<H, K>> {
        &mut self.views
    }

    /// A handle to the display buffer, for drawing from other threads
    pub fn display(&self) -> Option<SharedDisplay> {
        self.cx.display.clone()
    }

    /// The identity the device reported, if it answered the inquiry
    pub fn identity(&self) -> Option<&DeviceInquiry> {
        self.identity.as_ref()
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.transport.send(bytes) {
            log::error!("Couldn't send {:02X?}: {}", bytes, e);
        }
    }

    pub fn flush(&mut self) {
        self.flush_lights();
        self.flush_display();
    }

    fn flush_lights(&mut self) {
        let changes = self.cx.lights.flush();
        if changes.is_empty() {
            return;
        }

        let needs_rgb = self.config.pad_protocol.needs_rgb();
        let mut pads = Vec::new();
        let mut messages = Vec::new();

        for (key, color) in changes {
            log::trace!("{:?} -> {}", key, color);
            match key {
                LightKey::Pad(index) => {
                    let address = match self.config.controls.pads.to_hardware(index) {
                        Some(address) => address,
                        None => {
                            log::warn!("Pad {} doesn't exist on {}", index, self.config.name);
                            continue;
                        }
                    };
                    let rgb = if needs_rgb {
                        self.cx.colors.resolve_rgb(color)
                    } else {
                        Rgb::BLACK
                    };
                    pads.push(PadUpdate {
                        index,
                        address,
                        color,
                        rgb,
                    });
                }
                LightKey::Button(id) => {
                    let light = self
                        .config
                        .controls
                        .button(id)
                        .and_then(|button| button.light.map(|kind| (kind, button.address)));
                    match light {
                        Some((kind, address)) => messages
                            .push(protocols::short_message(kind, address, color).to_vec()),
                        None => log::warn!("Button {} has no light on {}", id, self.config.name),
                    }
                }
            }
        }

        let pad_kind = self.config.controls.pad_kind;
        let mut all = self.config.pad_protocol.encode(pad_kind, &pads);
        all.append(&mut messages);
        for message in &all {
            self.send(message);
        }
    }

    fn flush_display(&mut self) {
        let frames = match &self.cx.display {
            Some(display) => display.take_frames(Instant::now()),
            None => return,
        };
        for frame in &frames {
            self.send(frame);
        }
    }

    /// Stop the tickers, turn every light off, blank the display and say goodbye. Safe to call
    /// more than once; only the first call does anything.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }

        for ticker in &mut self.tickers {
            ticker.cancel();
        }
        self.tickers.clear();

        self.cx.lights.clear();
        if let Some(display) = &self.cx.display {
            display.clear();
        }
        self.flush();

        let goodbye = self.config.goodbye.clone();
        for frame in &goodbye {
            self.send(frame);
        }

        self.shut_down = true;
        log::debug!("{} shut down", self.config.name);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<H, K> Drop for ControlSurface<H, K> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
