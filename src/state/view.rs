use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::{Lifecycle, Machine, Observer};
use crate::ButtonId;

/// What the pad grid currently shows and how it reacts to hits
pub trait View<C>: Lifecycle<C> {
    /// `velocity == 0` is a release
    fn on_pad(&mut self, _cx: &mut C, _index: u8, _velocity: u8) {}

    /// Return true if the button was consumed
    fn on_button(&mut self, _cx: &mut C, _id: ButtonId, _pressed: bool) -> bool {
        false
    }

    fn draw(&mut self, _cx: &mut C) {}
}

/// Keeps track of the active [`View`], and remembers per context (e.g. per selected track) which
/// view the user chose last.
///
/// Every non-temporary [`ViewManager::set_active`] records the view as preferred for the current
/// context. [`ViewManager::switch_context`] then brings that view back, or the default view if the
/// context has no preference yet.
pub struct ViewManager<Id, K, C> {
    machine: Machine<Id, dyn View<C>>,
    preferred: HashMap<K, Id>,
    default_view: Option<Id>,
    context: Option<K>,
}

impl<Id, K, C> Default for ViewManager<Id, K, C>
where
    Id: Clone + Eq + Hash + Debug,
    K: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self {
            machine: Machine::new("view"),
            preferred: HashMap::new(),
            default_view: None,
            context: None,
        }
    }
}

impl<Id, K, C> ViewManager<Id, K, C>
where
    Id: Clone + Eq + Hash + Debug,
    K: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: Id, view: Box<dyn View<C>>) {
        self.machine.register(id, view);
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.machine.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Id> {
        self.machine.ids()
    }

    pub fn active(&self) -> Option<&Id> {
        self.machine.active()
    }

    pub fn active_view(&mut self) -> Option<&mut (dyn View<C> + 'static)> {
        self.machine.active_state_mut()
    }

    pub fn view_mut(&mut self, id: &Id) -> Option<&mut (dyn View<C> + 'static)> {
        self.machine.get_mut(id)
    }

    pub fn is_temporary(&self) -> bool {
        self.machine.is_temporary()
    }

    pub fn previous(&self) -> Option<&Id> {
        self.machine.restore_target()
    }

    pub fn observe(&mut self, observer: impl FnMut(Option<&Id>, &Id) + 'static) {
        self.machine.observe(Box::new(observer) as Observer<Id>);
    }

    pub fn context(&self) -> Option<&K> {
        self.context.as_ref()
    }

    /// The view used for contexts without a preference
    pub fn set_default_view(&mut self, id: Id) {
        if !self.contains(&id) {
            log::warn!("Default view {:?} isn't registered", id);
        }
        self.default_view = Some(id);
    }

    pub fn set_preferred_view(&mut self, context: K, id: Id) {
        if !self.contains(&id) {
            log::warn!("Preferred view {:?} for {:?} isn't registered", id, context);
        }
        self.preferred.insert(context, id);
    }

    /// The view recorded for `context`, or the default view
    pub fn preferred_view(&self, context: &K) -> Option<&Id> {
        self.preferred
            .get(context)
            .or_else(|| self.default_view.as_ref())
    }

    pub fn set_active(&mut self, id: Id, cx: &mut C) -> bool {
        if !self.machine.set_active(id.clone(), cx) {
            return false;
        }
        if let Some(context) = &self.context {
            self.preferred.insert(context.clone(), id);
        }
        true
    }

    /// Overlays are never recorded as preferred views
    pub fn set_temporary(&mut self, id: Id, cx: &mut C) -> bool {
        self.machine.set_temporary(id, cx)
    }

    pub fn restore_previous(&mut self, cx: &mut C) -> bool {
        self.machine.restore_previous(cx)
    }

    /// Enter a new context and activate its preferred view. Returns false if there's neither a
    /// preference nor a default, in which case the active view stays.
    pub fn switch_context(&mut self, context: K, cx: &mut C) -> bool {
        let target = self.preferred_view(&context).cloned();
        self.context = Some(context);

        match target {
            Some(id) => self.machine.set_active(id, cx),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::*;

    impl View<Journal> for Recorder {
        fn on_pad(&mut self, cx: &mut Journal, index: u8, velocity: u8) {
            cx.push(format!("{} pad {} {}", self.0, index, velocity));
        }
    }

    fn views() -> ViewManager<&'static str, u32, Journal> {
        let mut views = ViewManager::new();
        for id in ["clips", "drums", "keys", "shift"].iter() {
            views.register(*id, Box::new(Recorder(*id)));
        }
        views.set_default_view("clips");
        views
    }

    #[test]
    fn contexts_remember_their_view() {
        let mut views = views();
        let mut journal = Journal::new();

        assert!(views.switch_context(1, &mut journal));
        assert_eq!(views.active(), Some(&"clips"));
        views.set_active("drums", &mut journal);

        assert!(views.switch_context(2, &mut journal));
        assert_eq!(views.active(), Some(&"clips"));
        views.set_active("keys", &mut journal);

        views.switch_context(1, &mut journal);
        assert_eq!(views.active(), Some(&"drums"));
        views.switch_context(2, &mut journal);
        assert_eq!(views.active(), Some(&"keys"));
        assert_eq!(views.preferred_view(&3), Some(&"clips"));
    }

    #[test]
    fn overlays_are_not_preferences() {
        let mut views = views();
        let mut journal = Journal::new();
        views.switch_context(1, &mut journal);
        views.set_active("drums", &mut journal);

        views.set_temporary("shift", &mut journal);
        assert_eq!(views.preferred_view(&1), Some(&"drums"));

        // Leaving the context ends the overlay
        views.switch_context(2, &mut journal);
        assert!(!views.is_temporary());
        views.switch_context(1, &mut journal);
        assert_eq!(views.active(), Some(&"drums"));
    }

    #[test]
    fn shift_overlay_restores_the_view() {
        let mut views = views();
        let mut journal = Journal::new();
        views.set_active("keys", &mut journal);
        views.set_temporary("shift", &mut journal);
        if let Some(view) = views.active_view() {
            view.on_pad(&mut journal, 5, 100);
        }
        views.restore_previous(&mut journal);
        assert_eq!(views.active(), Some(&"keys"));
        assert_eq!(journal, vec!["+keys", "-keys", "+shift", "shift pad 5 100", "-shift", "+keys"]);
    }

    #[test]
    fn without_preference_or_default_nothing_changes() {
        let mut views: ViewManager<&'static str, u32, Journal> = ViewManager::new();
        let mut journal = Journal::new();
        views.register("a", Box::new(Recorder("a")));
        assert!(!views.switch_context(9, &mut journal));
        assert_eq!(views.active(), None);
        assert_eq!(views.context(), Some(&9));
    }
}
