//! Logical lights, the diffing store that decides what actually needs to be sent, and the
//! software blink clock.
//!
//! Most pad controllers can't flash on their own (or can only do it in ways that don't match the
//! host's idea of flashing), so blinking is emulated: a periodic tick flips a global phase, and
//! every light with a blink color is re-sent with the color for the new phase.

mod store;
pub use store::*;

use crate::{ButtonId, PaletteIndex, OFF};

/// The key of a light on a control surface
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LightKey {
    /// A pad of the grid, by logical index
    Pad(u8),
    /// A non-grid button with an LED
    Button(ButtonId),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlinkSpeed {
    /// Toggles once per blink period
    #[default]
    Slow,
    /// Toggles twice per blink period
    Fast,
}

/// The desired state of one light
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct LightState {
    /// The steady color, `OFF` for dark
    pub color: PaletteIndex,
    /// The color shown during the "on" half of a blink, `OFF` if not blinking
    pub blink_color: PaletteIndex,
    pub blink_speed: BlinkSpeed,
}

impl LightState {
    pub const OFF: LightState = LightState {
        color: OFF,
        blink_color: OFF,
        blink_speed: BlinkSpeed::Slow,
    };

    pub fn steady(color: PaletteIndex) -> Self {
        Self {
            color,
            ..Self::OFF
        }
    }

    pub fn blinking(color: PaletteIndex, blink_color: PaletteIndex, blink_speed: BlinkSpeed) -> Self {
        Self {
            color,
            blink_color,
            blink_speed,
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_color != OFF
    }

    /// The color that should be on the hardware right now
    pub fn effective(&self, phase: BlinkPhase) -> PaletteIndex {
        if self.is_blinking() && phase.is_on(self.blink_speed) {
            self.blink_color
        } else {
            self.color
        }
    }
}

/// Which half of the blink cycle each speed class is in. `true` means the blink color is showing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlinkPhase {
    pub fast: bool,
    pub slow: bool,
}

impl BlinkPhase {
    pub fn is_on(&self, speed: BlinkSpeed) -> bool {
        match speed {
            BlinkSpeed::Fast => self.fast,
            BlinkSpeed::Slow => self.slow,
        }
    }
}

/// Which speed classes flipped on a tick
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Toggled {
    pub fast: bool,
    pub slow: bool,
}

impl Toggled {
    pub fn contains(&self, speed: BlinkSpeed) -> bool {
        match speed {
            BlinkSpeed::Fast => self.fast,
            BlinkSpeed::Slow => self.slow,
        }
    }
}

/// Counts blink ticks. Ticks are expected every half blink period (see [`BlinkClock::tick_period`]):
/// fast blinks flip on every tick, slow blinks on every second one.
#[derive(Debug, Clone)]
pub struct BlinkClock {
    ticks: u64,
    phase: BlinkPhase,
}

impl Default for BlinkClock {
    fn default() -> Self {
        Self {
            ticks: 0,
            phase: BlinkPhase {
                fast: true,
                slow: true,
            },
        }
    }
}

impl BlinkClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// How often [`BlinkClock::advance`] must be called for slow blinks to flip once per
    /// `blink_period`
    pub fn tick_period(blink_period: std::time::Duration) -> std::time::Duration {
        blink_period / 2
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn advance(&mut self) -> Toggled {
        self.ticks += 1;

        let slow = self.ticks % 2 == 0;
        self.phase.fast = !self.phase.fast;
        if slow {
            self.phase.slow = !self.phase.slow;
        }

        Toggled { fast: true, slow }
    }
}
