//! Palette colors and the registry that maps semantic color names onto them.
//!
//! Every piece of hardware has its own palette: a small integer selects one of a fixed set of
//! colors that the device knows. Views and modes shouldn't care which integer that is on which
//! device, so they ask for colors by semantic name (see [`semantic`]) and the [`ColorRegistry`]
//! of the connected device translates.

use std::collections::HashMap;

/// An index into a device's color palette. `0` is off on every supported device.
pub type PaletteIndex = u8;

/// The palette index that turns a light off
pub const OFF: PaletteIndex = 0;

/// Semantic color names shared by the built-in views and device definitions.
pub mod semantic {
    pub const OFF: &str = "OFF";
    pub const ON: &str = "ON";
    pub const DIM: &str = "DIM";
    pub const SELECTED: &str = "SELECTED";
    pub const PAD_HAS_CONTENT: &str = "PAD_HAS_CONTENT";
    pub const STEP_SELECTED: &str = "STEP_SELECTED";
    pub const PLAYING: &str = "PLAYING";
    pub const RECORDING: &str = "RECORDING";
    pub const MUTED: &str = "MUTED";
}

/// A plain 8-bit-per-channel RGB color
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Downscale to the 7-bit components that fit into MIDI data bytes
    pub fn to_7bit(self) -> (u8, u8, u8) {
        (self.r >> 1, self.g >> 1, self.b >> 1)
    }

    /// Scale every component by `factor`, clamping to the valid range.
    ///
    /// ```
    /// # use surfacekit::Rgb;
    /// assert_eq!(Rgb::new(200, 100, 0).scale(0.5), Rgb::new(100, 50, 0));
    /// ```
    pub fn scale(self, factor: f32) -> Self {
        let scale_component = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self {
            r: scale_component(self.r),
            g: scale_component(self.g),
            b: scale_component(self.b),
        }
    }

    /// Mix two colors together. The proportion of the second color is specified by
    /// `proportion_of_other`.
    pub fn mix(self, other: Rgb, proportion_of_other: f32) -> Rgb {
        let p = proportion_of_other.clamp(0.0, 1.0);
        let mix_component =
            |a: u8, b: u8| (a as f32 * (1.0 - p) + b as f32 * p).round().clamp(0.0, 255.0) as u8;
        Self {
            r: mix_component(self.r, other.r),
            g: mix_component(self.g, other.g),
            b: mix_component(self.b, other.b),
        }
    }
}

#[cfg(feature = "embedded-graphics")]
impl From<Rgb> for embedded_graphics::pixelcolor::Rgb888 {
    fn from(color: Rgb) -> Self {
        Self::new(color.r, color.g, color.b)
    }
}

#[cfg(feature = "embedded-graphics")]
impl From<embedded_graphics::pixelcolor::Rgb888> for Rgb {
    fn from(color: embedded_graphics::pixelcolor::Rgb888) -> Self {
        use embedded_graphics::pixelcolor::RgbColor;

        Rgb::new(color.r(), color.g(), color.b())
    }
}

/// Maps semantic color ids to palette indices, and palette indices back to RGB.
///
/// The registry is filled once while a device definition is set up and then only read. Asking for
/// a semantic id that was never registered is a bug in the device definition: debug builds panic
/// so it gets noticed, release builds log it and hand out [`OFF`] so that the hardware never
/// receives an index it doesn't know.
///
/// ```
/// # use surfacekit::{ColorRegistry, Rgb, semantic};
/// let mut colors = ColorRegistry::new();
/// colors.register_color(semantic::SELECTED, 5);
/// colors.register_palette(5, Rgb::new(255, 0, 0));
///
/// assert_eq!(colors.resolve(semantic::SELECTED), 5);
/// assert_eq!(colors.resolve_rgb(5), Rgb::new(255, 0, 0));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorRegistry {
    semantic: HashMap<String, PaletteIndex>,
    palette: HashMap<PaletteIndex, Rgb>,
}

impl ColorRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_color(semantic::OFF, OFF);
        registry.register_palette(OFF, Rgb::BLACK);
        registry
    }

    /// Build a registry whose palette is `palette[i]` for index `i`
    pub fn with_palette(palette: &[Rgb]) -> Self {
        let mut registry = Self::new();
        for (index, &rgb) in palette.iter().enumerate().take(128) {
            registry.register_palette(index as PaletteIndex, rgb);
        }
        registry
    }

    pub fn register_color(&mut self, id: impl Into<String>, index: PaletteIndex) {
        self.semantic.insert(id.into(), index);
    }

    pub fn register_palette(&mut self, index: PaletteIndex, rgb: Rgb) {
        self.palette.insert(index, rgb);
    }

    /// Look up a semantic id, or None if it isn't registered
    pub fn try_resolve(&self, id: &str) -> Option<PaletteIndex> {
        self.semantic.get(id).copied()
    }

    /// Look up a semantic id. Unregistered ids are a programming error; see the type docs
    pub fn resolve(&self, id: &str) -> PaletteIndex {
        match self.try_resolve(id) {
            Some(index) => index,
            None => {
                log::error!("color id {:?} is not registered, falling back to off", id);
                debug_assert!(false, "color id {:?} is not registered", id);
                OFF
            }
        }
    }

    /// Look up the RGB value of a palette index. Unknown indices are shown as black
    pub fn resolve_rgb(&self, index: PaletteIndex) -> Rgb {
        match self.palette.get(&index) {
            Some(&rgb) => rgb,
            None => {
                log::warn!("palette index {} has no RGB value, using black", index);
                Rgb::BLACK
            }
        }
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.semantic.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_is_always_registered() {
        let colors = ColorRegistry::new();
        assert_eq!(colors.resolve(semantic::OFF), OFF);
        assert_eq!(colors.resolve_rgb(OFF), Rgb::BLACK);
    }

    #[test]
    fn later_registration_wins() {
        let mut colors = ColorRegistry::new();
        colors.register_color(semantic::PLAYING, 21);
        colors.register_color(semantic::PLAYING, 22);
        assert_eq!(colors.resolve(semantic::PLAYING), 22);
    }

    #[test]
    fn palette_table_is_indexed_by_position() {
        let colors = ColorRegistry::with_palette(&[
            Rgb::BLACK,
            Rgb::new(30, 30, 30),
            Rgb::new(127, 127, 127),
            Rgb::WHITE,
        ]);
        assert_eq!(colors.resolve_rgb(3), Rgb::WHITE);
        assert_eq!(colors.resolve_rgb(1), Rgb::new(30, 30, 30));
        assert_eq!(colors.resolve_rgb(99), Rgb::BLACK);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn unregistered_id_falls_back_to_off() {
        let colors = ColorRegistry::new();
        assert_eq!(colors.resolve("NOT_THERE"), OFF);
    }

    #[test]
    fn rgb_helpers() {
        assert_eq!(Rgb::WHITE.to_7bit(), (127, 127, 127));
        assert_eq!(Rgb::BLACK.mix(Rgb::new(100, 200, 50), 0.5), Rgb::new(50, 100, 25));
        assert_eq!(Rgb::new(200, 200, 200).scale(2.0), Rgb::WHITE);
    }
}
