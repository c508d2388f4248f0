//! Mode and view state machines.
//!
//! Both are the same machine underneath: a set of registered states of which at most one is
//! active, with activation hooks, change observers, and a "temporary" activation that remembers
//! where to return to (used for momentary overlays like holding Shift).
//!
//! Hooks get a `&mut C` context but never the manager itself, so a hook can't switch states
//! while a switch is in progress. Anything that wants to switch from inside a hook goes through
//! the context (see [`crate::surface::Context::request`]), and the request is applied after the
//! current transition has finished.

mod mode;
mod view;

pub use mode::*;
pub use view::*;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Activation hooks shared by modes and views
pub trait Lifecycle<C> {
    fn on_activate(&mut self, _cx: &mut C) {}
    fn on_deactivate(&mut self, _cx: &mut C) {}
}

/// Called with `(previous, new)` after every transition
pub type Observer<Id> = Box<dyn FnMut(Option<&Id>, &Id)>;

pub(crate) struct Machine<Id, T: ?Sized> {
    kind: &'static str,
    states: HashMap<Id, Box<T>>,
    active: Option<Id>,
    // Where `restore_previous` goes back to. Only set while a temporary state is active.
    restore_to: Option<Id>,
    observers: Vec<Observer<Id>>,
}

impl<Id, T> Machine<Id, T>
where
    Id: Clone + Eq + Hash + Debug,
    T: ?Sized,
{
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            states: HashMap::new(),
            active: None,
            restore_to: None,
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, id: Id, state: Box<T>) {
        if self.states.insert(id.clone(), state).is_some() {
            log::warn!("Replaced {} {:?}", self.kind, id);
        }
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.states.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.states.keys()
    }

    pub fn active(&self) -> Option<&Id> {
        self.active.as_ref()
    }

    pub fn active_state_mut(&mut self) -> Option<&mut T> {
        let id = self.active.as_ref()?;
        self.states.get_mut(id).map(|state| &mut **state)
    }

    pub fn get_mut(&mut self, id: &Id) -> Option<&mut T> {
        self.states.get_mut(id).map(|state| &mut **state)
    }

    pub fn is_temporary(&self) -> bool {
        self.restore_to.is_some()
    }

    pub fn restore_target(&self) -> Option<&Id> {
        self.restore_to.as_ref()
    }

    pub fn observe(&mut self, observer: Observer<Id>) {
        self.observers.push(observer);
    }

    fn switch<C>(&mut self, id: Id, cx: &mut C)
    where
        T: Lifecycle<C>,
    {
        let previous = self.active.take();

        if let Some(previous_id) = &previous {
            if let Some(state) = self.states.get_mut(previous_id) {
                state.on_deactivate(cx);
            }
        }
        if let Some(state) = self.states.get_mut(&id) {
            state.on_activate(cx);
        }
        self.active = Some(id.clone());

        log::debug!("{} {:?} -> {:?}", self.kind, previous, id);
        for observer in &mut self.observers {
            observer(previous.as_ref(), &id);
        }
    }

    /// Returns false for unknown ids
    fn check_known(&self, id: &Id) -> bool {
        if self.contains(id) {
            true
        } else {
            log::warn!("Unknown {} {:?}, staying in {:?}", self.kind, id, self.active);
            false
        }
    }

    pub fn set_active<C>(&mut self, id: Id, cx: &mut C) -> bool
    where
        T: Lifecycle<C>,
    {
        if !self.check_known(&id) {
            return false;
        }

        self.restore_to = None;
        if self.active.as_ref() != Some(&id) {
            self.switch(id, cx);
        }
        true
    }

    pub fn set_temporary<C>(&mut self, id: Id, cx: &mut C) -> bool
    where
        T: Lifecycle<C>,
    {
        if !self.check_known(&id) {
            return false;
        }
        if self.active.as_ref() == Some(&id) {
            return true;
        }

        if self.restore_to.as_ref() == Some(&id) {
            // Going back to where the overlay started is just a restore
            self.restore_to = None;
        } else if self.restore_to.is_none() {
            // Nested overlays return to the state before the first one
            self.restore_to = self.active.clone();
        }
        self.switch(id, cx);
        true
    }

    pub fn restore_previous<C>(&mut self, cx: &mut C) -> bool
    where
        T: Lifecycle<C>,
    {
        match self.restore_to.take() {
            Some(id) if self.contains(&id) => {
                self.switch(id, cx);
                true
            }
            Some(id) => {
                log::warn!("Can't restore {} {:?}, it's gone", self.kind, id);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A context that records which hooks ran
    pub type Journal = Vec<String>;

    pub struct Recorder(pub &'static str);

    impl Lifecycle<Journal> for Recorder {
        fn on_activate(&mut self, cx: &mut Journal) {
            cx.push(format!("+{}", self.0));
        }

        fn on_deactivate(&mut self, cx: &mut Journal) {
            cx.push(format!("-{}", self.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn machine() -> Machine<&'static str, Recorder> {
        let mut machine = Machine::new("state");
        for id in ["a", "b", "c"].iter() {
            machine.register(*id, Box::new(Recorder(*id)));
        }
        machine
    }

    #[test]
    fn hooks_run_in_order() {
        let mut machine = machine();
        let mut journal = Journal::new();

        assert!(machine.set_active("a", &mut journal));
        assert!(machine.set_active("b", &mut journal));
        assert_eq!(journal, vec!["+a", "-a", "+b"]);
        assert_eq!(machine.active(), Some(&"b"));
    }

    #[test]
    fn switching_to_the_active_state_does_nothing() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_active("a", &mut journal);
        machine.set_temporary("a", &mut journal);
        assert_eq!(journal, vec!["+a"]);
        assert!(!machine.is_temporary());
    }

    #[test]
    fn unknown_ids_are_refused() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        assert!(!machine.set_active("zzz", &mut journal));
        assert!(!machine.set_temporary("zzz", &mut journal));
        assert_eq!(machine.active(), Some(&"a"));
    }

    #[test]
    fn temporary_then_restore() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_temporary("b", &mut journal);
        assert!(machine.is_temporary());
        assert_eq!(machine.restore_target(), Some(&"a"));

        assert!(machine.restore_previous(&mut journal));
        assert_eq!(machine.active(), Some(&"a"));
        assert!(!machine.is_temporary());
        // Nothing left to restore
        assert!(!machine.restore_previous(&mut journal));
        assert_eq!(machine.active(), Some(&"a"));
    }

    #[test]
    fn restore_after_a_normal_switch_is_a_no_op() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_active("b", &mut journal);
        assert!(!machine.restore_previous(&mut journal));
        assert_eq!(machine.active(), Some(&"b"));
    }

    #[test]
    fn nested_overlays_return_to_the_first_state() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_temporary("b", &mut journal);
        machine.set_temporary("c", &mut journal);
        assert_eq!(machine.restore_target(), Some(&"a"));
        machine.restore_previous(&mut journal);
        assert_eq!(machine.active(), Some(&"a"));
    }

    #[test]
    fn overlay_back_to_the_origin_never_points_at_itself() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_temporary("b", &mut journal);
        machine.set_temporary("a", &mut journal);
        assert_eq!(machine.active(), Some(&"a"));
        assert_eq!(machine.restore_target(), None);
    }

    #[test]
    fn a_normal_switch_ends_the_overlay() {
        let mut machine = machine();
        let mut journal = Journal::new();
        machine.set_active("a", &mut journal);
        machine.set_temporary("b", &mut journal);
        machine.set_active("c", &mut journal);
        assert!(!machine.restore_previous(&mut journal));
        assert_eq!(machine.active(), Some(&"c"));
    }

    #[test]
    fn observers_see_every_transition() {
        let mut machine = machine();
        let mut journal = Journal::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        machine.observe(Box::new(move |previous, new| {
            sink.borrow_mut().push((previous.copied(), *new));
        }));

        machine.set_active("a", &mut journal);
        machine.set_temporary("b", &mut journal);
        machine.restore_previous(&mut journal);
        assert_eq!(
            *seen.borrow(),
            vec![(None, "a"), (Some("a"), "b"), (Some("b"), "a")]
        );
    }
}
