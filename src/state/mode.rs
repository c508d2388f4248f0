use std::fmt::Debug;
use std::hash::Hash;

use super::{Lifecycle, Machine, Observer};
use crate::{ButtonId, KnobChange};

/// What the knobs currently control.
///
/// Every handler has a do-nothing default, so a mode only implements what it binds.
pub trait Mode<C>: Lifecycle<C> {
    fn on_knob(&mut self, _cx: &mut C, _index: u8, _change: KnobChange) {}

    fn on_knob_touch(&mut self, _cx: &mut C, _index: u8, _touched: bool) {}

    /// Return true if the button was consumed
    fn on_button(&mut self, _cx: &mut C, _id: ButtonId, _pressed: bool) -> bool {
        false
    }

    /// Write this mode's lights and display content into the context
    fn draw(&mut self, _cx: &mut C) {}
}

/// Keeps track of the active [`Mode`] of a control surface.
///
/// ```
/// # use surfacekit::state::{Lifecycle, Mode, ModeManager};
/// struct Volume;
/// impl Lifecycle<()> for Volume {}
/// impl Mode<()> for Volume {}
/// struct Pan;
/// impl Lifecycle<()> for Pan {}
/// impl Mode<()> for Pan {}
///
/// let mut modes: ModeManager<&str, ()> = ModeManager::new();
/// modes.register("volume", Box::new(Volume));
/// modes.register("pan", Box::new(Pan));
///
/// modes.set_active("volume", &mut ());
/// // Holding a button shows pan for a moment
/// modes.set_temporary("pan", &mut ());
/// modes.restore_previous(&mut ());
/// assert_eq!(modes.active(), Some(&"volume"));
/// ```
pub struct ModeManager<Id, C> {
    machine: Machine<Id, dyn Mode<C>>,
}

impl<Id, C> Default for ModeManager<Id, C>
where
    Id: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self {
            machine: Machine::new("mode"),
        }
    }
}

impl<Id, C> ModeManager<Id, C>
where
    Id: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: Id, mode: Box<dyn Mode<C>>) {
        self.machine.register(id, mode);
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.machine.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.machine.ids()
    }

    /// None until the first activation
    pub fn active(&self) -> Option<&Id> {
        self.machine.active()
    }

    pub fn active_mode(&mut self) -> Option<&mut (dyn Mode<C> + 'static)> {
        self.machine.active_state_mut()
    }

    pub fn mode_mut(&mut self, id: &Id) -> Option<&mut (dyn Mode<C> + 'static)> {
        self.machine.get_mut(id)
    }

    pub fn is_temporary(&self) -> bool {
        self.machine.is_temporary()
    }

    /// The mode `restore_previous` would go back to
    pub fn previous(&self) -> Option<&Id> {
        self.machine.restore_target()
    }

    pub fn observe(&mut self, observer: impl FnMut(Option<&Id>, &Id) + 'static) {
        self.machine.observe(Box::new(observer) as Observer<Id>);
    }

    /// Switch modes for good. Ends any temporary overlay; switching to the active mode does
    /// nothing else. Returns false for unknown ids.
    pub fn set_active(&mut self, id: Id, cx: &mut C) -> bool {
        self.machine.set_active(id, cx)
    }

    /// Switch modes until [`ModeManager::restore_previous`] is called
    pub fn set_temporary(&mut self, id: Id, cx: &mut C) -> bool {
        self.machine.set_temporary(id, cx)
    }

    /// Go back to the mode that was active before the current temporary one. No-op (returning
    /// false) if the current mode wasn't entered temporarily.
    pub fn restore_previous(&mut self, cx: &mut C) -> bool {
        self.machine.restore_previous(cx)
    }
}
