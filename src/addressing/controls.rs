use std::borrow::Cow;

use std::collections::HashSet;

use super::{CoordinateTranslator, HardwareAddress, MessageKind, PadMap};
use crate::ConfigError;

/// Identifies a non-grid button within one device definition. The device modules define named
/// constants for their buttons.
pub type ButtonId = u8;

/// A button that isn't part of the pad grid
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonBinding {
    pub id: ButtonId,
    /// The message kind the button sends when pressed
    pub kind: MessageKind,
    pub address: HardwareAddress,
    /// How the button's LED is addressed, if it has one. It uses the same address as the input.
    pub light: Option<MessageKind>,
}

/// How a knob or encoder reports its value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnobEncoding {
    /// Plain absolute value `0..128`
    Absolute,
    /// 1..=63 is +1..=+63, 65..=127 is -63..=-1
    TwosComplement,
    /// Bit 6 is the sign, bits 0..6 the magnitude
    SignMagnitude,
    /// 64 is "no change", above is positive, below is negative
    Offset64,
}

impl KnobEncoding {
    pub fn decode(self, value: u8) -> KnobChange {
        let value = value & 0x7F;
        match self {
            Self::Absolute => KnobChange::Absolute(value),
            Self::TwosComplement => {
                if value < 64 {
                    KnobChange::Relative(value as i8)
                } else {
                    KnobChange::Relative((value as i16 - 128) as i8)
                }
            }
            Self::SignMagnitude => {
                let magnitude = (value & 0x3F) as i8;
                if value & 0x40 != 0 {
                    KnobChange::Relative(-magnitude)
                } else {
                    KnobChange::Relative(magnitude)
                }
            }
            Self::Offset64 => KnobChange::Relative(value as i8 - 64),
        }
    }
}

/// The change reported by a knob
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KnobChange {
    Absolute(u8),
    Relative(i8),
}

/// A knob, fader or encoder
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnobBinding {
    pub index: u8,
    /// Knobs always send control changes
    pub address: HardwareAddress,
    pub encoding: KnobEncoding,
    /// Note address of the capacitive touch sensor, if the knob has one
    pub touch: Option<HardwareAddress>,
}

/// A decoded hardware input
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InputEvent {
    /// A pad was hit (`velocity > 0`) or released (`velocity == 0`)
    Pad { index: u8, velocity: u8 },
    Button { id: ButtonId, pressed: bool },
    Knob { index: u8, change: KnobChange },
    KnobTouch { index: u8, touched: bool },
}

/// The full set of controls of one device: pads, buttons and knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlMap {
    pub pads: PadMap,
    /// The message kind pads send and are lit with
    pub pad_kind: MessageKind,
    pub buttons: Cow<'static, [ButtonBinding]>,
    pub knobs: Cow<'static, [KnobBinding]>,
}

impl ControlMap {
    pub fn button(&self, id: ButtonId) -> Option<&ButtonBinding> {
        self.buttons.iter().find(|binding| binding.id == id)
    }

    pub fn knob(&self, index: u8) -> Option<&KnobBinding> {
        self.knobs.iter().find(|binding| binding.index == index)
    }

    /// Check the pad map, and that no two controls listen on the same message
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pads.validate()?;

        let mut seen = HashSet::new();
        let pads = (0..self.pads.len())
            .filter_map(|index| self.pads.to_hardware(index))
            .map(|address| (self.pad_kind, address));
        let buttons = self.buttons.iter().map(|button| (button.kind, button.address));
        let knobs = self
            .knobs
            .iter()
            .map(|knob| (MessageKind::ControlChange, knob.address));
        let touches = self
            .knobs
            .iter()
            .filter_map(|knob| knob.touch)
            .map(|address| (MessageKind::Note, address));

        for (kind, address) in pads.chain(buttons).chain(knobs).chain(touches) {
            if !address.is_valid() {
                return Err(ConfigError::NotSevenBit {
                    byte: address.code.max(address.channel),
                });
            }
            if !seen.insert((kind, address)) {
                return Err(ConfigError::DuplicateAddress {
                    channel: address.channel,
                    code: address.code,
                });
            }
        }
        Ok(())
    }

    /// Decode a raw short MIDI message. Returns None for messages that don't belong to any bound
    /// control, and for anything that isn't a note or control change.
    ///
    /// Note Off and Note On with velocity 0 are both treated as releases.
    pub fn decode(&self, data: &[u8]) -> Option<InputEvent> {
        let (status, code, value) = match *data {
            [status, code, value] => (status, code, value),
            _ => return None,
        };
        let channel = status & 0x0F;
        let address = HardwareAddress::new(channel, code);

        let (kind, value) = match status & 0xF0 {
            0x80 => (MessageKind::Note, 0),
            0x90 => (MessageKind::Note, value),
            0xB0 => (MessageKind::ControlChange, value),
            _ => return None,
        };

        if kind == MessageKind::Note {
            let touched = self
                .knobs
                .iter()
                .find(|knob| knob.touch == Some(address));
            if let Some(knob) = touched {
                return Some(InputEvent::KnobTouch {
                    index: knob.index,
                    touched: value > 0,
                });
            }
        }

        let button = self
            .buttons
            .iter()
            .find(|button| button.kind == kind && button.address == address);
        if let Some(button) = button {
            return Some(InputEvent::Button {
                id: button.id,
                pressed: value > 0,
            });
        }

        if kind == self.pad_kind {
            if let Some(index) = self.pads.to_logical(address) {
                return Some(InputEvent::Pad {
                    index,
                    velocity: value,
                });
            }
        }

        if kind == MessageKind::ControlChange {
            let knob = self.knobs.iter().find(|knob| knob.address == address);
            if let Some(knob) = knob {
                return Some(InputEvent::Knob {
                    index: knob.index,
                    change: knob.encoding.decode(value),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> ControlMap {
        ControlMap {
            pads: PadMap::Linear {
                rows: 2,
                columns: 4,
                channel: 0,
                first: 36,
                row_stride: 4,
                bottom_up: true,
            },
            pad_kind: MessageKind::Note,
            buttons: Cow::Owned(vec![
                ButtonBinding {
                    id: 0,
                    kind: MessageKind::Note,
                    address: HardwareAddress::new(0, 0x30),
                    light: Some(MessageKind::ControlChange),
                },
                ButtonBinding {
                    id: 1,
                    kind: MessageKind::ControlChange,
                    address: HardwareAddress::new(0, 104),
                    light: None,
                },
            ]),
            knobs: Cow::Owned(vec![KnobBinding {
                index: 0,
                address: HardwareAddress::new(0, 0x10),
                encoding: KnobEncoding::TwosComplement,
                touch: Some(HardwareAddress::new(0, 0x10)),
            }]),
        }
    }

    #[test]
    fn pads_press_and_release() {
        let controls = controls();
        // Bottom row starts at 36, so 36 is logical row 1
        assert_eq!(
            controls.decode(&[0x90, 36, 100]),
            Some(InputEvent::Pad { index: 4, velocity: 100 })
        );
        assert_eq!(
            controls.decode(&[0x90, 43, 0]),
            Some(InputEvent::Pad { index: 3, velocity: 0 })
        );
        assert_eq!(
            controls.decode(&[0x80, 43, 64]),
            Some(InputEvent::Pad { index: 3, velocity: 0 })
        );
    }

    #[test]
    fn buttons_win_over_pads_and_knobs() {
        let controls = controls();
        assert_eq!(
            controls.decode(&[0x90, 0x30, 127]),
            Some(InputEvent::Button { id: 0, pressed: true })
        );
        assert_eq!(
            controls.decode(&[0xB0, 104, 0]),
            Some(InputEvent::Button { id: 1, pressed: false })
        );
    }

    #[test]
    fn knob_turns_and_touches() {
        let controls = controls();
        assert_eq!(
            controls.decode(&[0xB0, 0x10, 127]),
            Some(InputEvent::Knob { index: 0, change: KnobChange::Relative(-1) })
        );
        // Same number, but a note: that's the touch sensor
        assert_eq!(
            controls.decode(&[0x90, 0x10, 127]),
            Some(InputEvent::KnobTouch { index: 0, touched: true })
        );
    }

    #[test]
    fn unknown_messages_are_ignored() {
        let controls = controls();
        assert_eq!(controls.decode(&[0x91, 36, 100]), None);
        assert_eq!(controls.decode(&[0xE0, 0, 64]), None);
        assert_eq!(controls.decode(&[0xF0, 0x7E, 0x7F, 0xF7]), None);
    }

    #[test]
    fn overlapping_controls_are_caught() {
        let mut controls = controls();
        assert_eq!(controls.validate(), Ok(()));

        controls.buttons.to_mut().push(ButtonBinding {
            id: 2,
            kind: MessageKind::Note,
            address: HardwareAddress::new(0, 40),
            light: None,
        });
        assert_eq!(
            controls.validate(),
            Err(ConfigError::DuplicateAddress { channel: 0, code: 40 })
        );
    }

    #[test]
    fn relative_encodings() {
        assert_eq!(KnobEncoding::TwosComplement.decode(3), KnobChange::Relative(3));
        assert_eq!(KnobEncoding::TwosComplement.decode(125), KnobChange::Relative(-3));
        assert_eq!(KnobEncoding::TwosComplement.decode(64), KnobChange::Relative(-64));
        assert_eq!(KnobEncoding::TwosComplement.decode(127), KnobChange::Relative(-1));
        assert_eq!(KnobEncoding::TwosComplement.decode(63), KnobChange::Relative(63));
        assert_eq!(KnobEncoding::SignMagnitude.decode(0x43), KnobChange::Relative(-3));
        assert_eq!(KnobEncoding::SignMagnitude.decode(0x03), KnobChange::Relative(3));
        assert_eq!(KnobEncoding::Offset64.decode(61), KnobChange::Relative(-3));
        assert_eq!(KnobEncoding::Absolute.decode(90), KnobChange::Absolute(90));
    }
}
