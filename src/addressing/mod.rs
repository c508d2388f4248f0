//! Translation between logical control addresses and the MIDI addresses a device actually uses.
//!
//! Pads are addressed logically by a row-major index, row 0 at the top. Every device numbers its
//! pads differently on the wire: some count from the bottom, some skip codes between rows, some
//! use one MIDI channel per row or column, and some have no pattern at all. [`PadMap`] covers
//! those cases; anything else can implement [`CoordinateTranslator`] directly.

mod pad_map;
pub use pad_map::*;

mod controls;
pub use controls::*;

use std::collections::HashSet;

use crate::ConfigError;

/// The kind of short MIDI message a control speaks
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    Note,
    ControlChange,
}

impl MessageKind {
    /// The status nibble used when sending to the device
    pub fn status(self) -> u8 {
        match self {
            Self::Note => 0x90,
            Self::ControlChange => 0xB0,
        }
    }
}

/// A (channel, note-or-CC number) pair, as understood by the hardware
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareAddress {
    /// Zero-based MIDI channel, `0..16`
    pub channel: u8,
    /// Note or controller number, `0..128`
    pub code: u8,
}

impl HardwareAddress {
    pub const fn new(channel: u8, code: u8) -> Self {
        Self { channel, code }
    }

    pub fn is_valid(&self) -> bool {
        self.channel < 16 && self.code < 128
    }
}

/// The function pair that maps logical pad indices to hardware addresses and back.
///
/// For every index in `0..len()`, `to_logical(to_hardware(i)) == Some(i)` must hold. A broken
/// table shows up on the hardware as the wrong pad lighting up, which is easy to miss by eye, so
/// every table should be run through [`CoordinateTranslator::validate`] in a test.
pub trait CoordinateTranslator {
    /// Number of logical pads; valid indices are `0..len()`
    fn len(&self) -> u8;

    /// The hardware address of a logical pad, or None if the index is out of range
    fn to_hardware(&self, index: u8) -> Option<HardwareAddress>;

    /// The logical pad at a hardware address, or None if no pad lives there
    fn to_logical(&self, address: HardwareAddress) -> Option<u8>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the translation is total and invertible over `0..len()` and that it only
    /// produces valid MIDI addresses.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for index in 0..self.len() {
            let address = self
                .to_hardware(index)
                .ok_or(ConfigError::Unmapped { index })?;

            if !address.is_valid() {
                return Err(ConfigError::NotSevenBit {
                    byte: address.code.max(address.channel),
                });
            }
            if !seen.insert(address) {
                return Err(ConfigError::DuplicateAddress {
                    channel: address.channel,
                    code: address.code,
                });
            }

            let got = self.to_logical(address);
            if got != Some(index) {
                return Err(ConfigError::RoundTrip { index, got });
            }
        }
        Ok(())
    }
}
