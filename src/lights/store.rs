use std::collections::{BTreeMap, BTreeSet};

use super::{BlinkClock, BlinkPhase, LightState, Toggled};
use crate::PaletteIndex;

#[derive(Debug, Clone, Default)]
struct Entry {
    desired: LightState,
    // The effective color that was last handed out by `flush`. None means the hardware state is
    // unknown, so the next flush sends the light no matter what.
    sent: Option<PaletteIndex>,
}

/// Holds the desired state of every light and what was last sent for it, and works out the
/// minimal set of changes on each flush.
///
/// `LightStore` works like a double buffer: views write the desired state as
/// often as they like, and [`LightStore::flush`] returns only those lights whose effective color
/// differs from what the hardware was last told. The snapshot is updated optimistically; if
/// sending fails, a later [`LightStore::invalidate`] and redraw brings the hardware back in line.
///
/// ```
/// # use surfacekit::LightStore;
/// let mut lights = LightStore::new();
///
/// lights.set_color(10u8, 5);
/// assert_eq!(lights.flush(), vec![(10, 5)]);
/// // Nothing changed, nothing to send
/// assert!(lights.flush().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LightStore<K> {
    lights: BTreeMap<K, Entry>,
    // Lights touched since the last flush
    dirty: BTreeSet<K>,
    // Lights with a blink color; nothing else is ever in here
    blinking: BTreeSet<K>,
    // Blinking lights whose phase flipped since the last flush
    forced: BTreeSet<K>,
    clock: BlinkClock,
}

impl<K: Copy + Ord> Default for LightStore<K> {
    fn default() -> Self {
        Self {
            lights: BTreeMap::new(),
            dirty: BTreeSet::new(),
            blinking: BTreeSet::new(),
            forced: BTreeSet::new(),
            clock: BlinkClock::new(),
        }
    }
}

impl<K: Copy + Ord> LightStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the desired state of a light. Cheap and idempotent; call it as often as you like
    /// between flushes.
    pub fn set_desired(&mut self, key: K, state: LightState) {
        self.lights.entry(key).or_default().desired = state;
        self.dirty.insert(key);

        if state.is_blinking() {
            self.blinking.insert(key);
        } else {
            self.blinking.remove(&key);
            self.forced.remove(&key);
        }
    }

    /// Shorthand for a steady, non-blinking color
    pub fn set_color(&mut self, key: K, color: PaletteIndex) {
        self.set_desired(key, LightState::steady(color));
    }

    pub fn desired(&self, key: K) -> LightState {
        self.lights
            .get(&key)
            .map(|entry| entry.desired)
            .unwrap_or_default()
    }

    /// The effective color last returned by `flush` for this light
    pub fn sent(&self, key: K) -> Option<PaletteIndex> {
        self.lights.get(&key).and_then(|entry| entry.sent)
    }

    pub fn is_blinking(&self, key: K) -> bool {
        self.blinking.contains(&key)
    }

    pub fn blink_phase(&self) -> BlinkPhase {
        self.clock.phase()
    }

    /// All lights that have ever been touched
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.lights.keys().copied()
    }

    /// Advance the blink clock. Every blinking light whose speed class flipped will be part of
    /// the next flush, even if nothing else about it changed.
    pub fn blink_tick(&mut self) -> Toggled {
        let toggled = self.clock.advance();

        for &key in &self.blinking {
            let speed = self.lights[&key].desired.blink_speed;
            if toggled.contains(speed) {
                self.forced.insert(key);
            }
        }

        toggled
    }

    /// Forget what was sent. The next flush will include every known light.
    pub fn invalidate(&mut self) {
        for (key, entry) in &mut self.lights {
            entry.sent = None;
            self.dirty.insert(*key);
        }
    }

    /// Set every known light to off, e.g. before disconnecting
    pub fn clear(&mut self) {
        let keys: Vec<K> = self.keys().collect();
        for key in keys {
            self.set_desired(key, LightState::OFF);
        }
    }

    /// Whether the next flush could return anything
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty() || !self.forced.is_empty()
    }

    /// Compute the changes to send, as `(key, effective color)` pairs ordered by key, and record
    /// them as sent.
    pub fn flush(&mut self) -> Vec<(K, PaletteIndex)> {
        let phase = self.clock.phase();
        let candidates: BTreeSet<K> = self.dirty.union(&self.forced).copied().collect();

        let mut changes = Vec::with_capacity(candidates.len());
        for key in candidates {
            let entry = match self.lights.get_mut(&key) {
                Some(entry) => entry,
                None => continue,
            };

            let effective = entry.desired.effective(phase);
            if self.forced.contains(&key) || entry.sent != Some(effective) {
                entry.sent = Some(effective);
                changes.push((key, effective));
            }
        }

        self.dirty.clear();
        self.forced.clear();

        changes
    }
}
