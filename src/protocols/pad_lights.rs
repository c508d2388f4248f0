//! Encoding of pad LED updates into MIDI messages

use std::borrow::Cow;

use super::sysex;
use crate::{ConfigError, HardwareAddress, MessageKind, PaletteIndex, Rgb};

/// Which number identifies a pad inside a batched SysEx update
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LedAddressing {
    /// The note/CC number of the pad
    Hardware,
    /// The logical pad index (e.g. Akai Fire pad LEDs are numbered 0..64)
    LogicalIndex,
}

/// How a device wants its pad colors
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PadProtocol {
    /// One note/CC message per pad, the palette index is the velocity/value
    ShortMessage,
    /// Palette indices in one SysEx: `header, (entry_prefix, pad, palette)*, F7`
    SysexPalette {
        header: Cow<'static, [u8]>,
        entry_prefix: Cow<'static, [u8]>,
        addressing: LedAddressing,
        max_entries: usize,
    },
    /// 7-bit RGB in one SysEx: `header, command, length (14 bit), (pad, r, g, b)*, F7`
    SysexRgb {
        header: Cow<'static, [u8]>,
        command: u8,
        addressing: LedAddressing,
        max_entries: usize,
    },
}

/// One pad that needs a new color
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PadUpdate {
    pub index: u8,
    pub address: HardwareAddress,
    pub color: PaletteIndex,
    /// Only consulted by RGB protocols
    pub rgb: Rgb,
}

impl PadUpdate {
    fn pad_byte(&self, addressing: LedAddressing) -> u8 {
        match addressing {
            LedAddressing::Hardware => self.address.code,
            LedAddressing::LogicalIndex => self.index,
        }
    }
}

/// A short message lighting a control at `address`
pub fn short_message(kind: MessageKind, address: HardwareAddress, color: PaletteIndex) -> [u8; 3] {
    [
        kind.status() | (address.channel & 0x0F),
        address.code & 0x7F,
        color & 0x7F,
    ]
}

impl PadProtocol {
    /// Whether the protocol needs RGB values rather than palette indices
    pub fn needs_rgb(&self) -> bool {
        matches!(self, Self::SysexRgb { .. })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::ShortMessage => Ok(()),
            Self::SysexPalette {
                header,
                entry_prefix,
                ..
            } => {
                sysex::check_header(header)?;
                sysex::check_data(entry_prefix)
            }
            Self::SysexRgb {
                header, command, ..
            } => {
                sysex::check_header(header)?;
                sysex::check_data(&[*command])
            }
        }
    }

    /// Encode the updates into as few messages as the protocol allows
    pub fn encode(&self, kind: MessageKind, updates: &[PadUpdate]) -> Vec<Vec<u8>> {
        if updates.is_empty() {
            return Vec::new();
        }

        match self {
            Self::ShortMessage => updates
                .iter()
                .map(|update| short_message(kind, update.address, update.color).to_vec())
                .collect(),
            Self::SysexPalette {
                header,
                entry_prefix,
                addressing,
                max_entries,
            } => updates
                .chunks((*max_entries).max(1))
                .map(|chunk| {
                    let mut bytes =
                        Vec::with_capacity(header.len() + chunk.len() * (entry_prefix.len() + 2) + 1);
                    bytes.extend_from_slice(header);
                    for update in chunk {
                        bytes.extend_from_slice(entry_prefix);
                        bytes.push(update.pad_byte(*addressing) & 0x7F);
                        bytes.push(update.color & 0x7F);
                    }
                    bytes.push(sysex::SYSEX_END);
                    bytes
                })
                .collect(),
            Self::SysexRgb {
                header,
                command,
                addressing,
                max_entries,
            } => updates
                .chunks((*max_entries).max(1))
                .map(|chunk| {
                    let mut payload = Vec::with_capacity(2 + chunk.len() * 4);
                    payload.extend_from_slice(&sysex::length_14bit(chunk.len() * 4));
                    for update in chunk {
                        let (r, g, b) = update.rgb.to_7bit();
                        payload.extend_from_slice(&[update.pad_byte(*addressing) & 0x7F, r, g, b]);
                    }
                    sysex::frame(header, *command, &payload)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(index: u8, code: u8, color: PaletteIndex, rgb: Rgb) -> PadUpdate {
        PadUpdate {
            index,
            address: HardwareAddress::new(0, code),
            color,
            rgb,
        }
    }

    #[test]
    fn short_messages() {
        let messages = PadProtocol::ShortMessage.encode(
            MessageKind::Note,
            &[
                update(0, 81, 5, Rgb::BLACK),
                PadUpdate {
                    address: HardwareAddress::new(2, 53),
                    ..update(1, 0, 0, Rgb::BLACK)
                },
            ],
        );
        assert_eq!(messages, vec![vec![0x90, 81, 5], vec![0x92, 53, 0]]);
    }

    #[test]
    fn palette_sysex_is_batched_and_split() {
        let protocol = PadProtocol::SysexPalette {
            header: Cow::Borrowed(&[240, 0, 32, 41, 2, 13, 3]),
            entry_prefix: Cow::Borrowed(&[0]),
            addressing: LedAddressing::Hardware,
            max_entries: 2,
        };
        assert_eq!(protocol.validate(), Ok(()));

        let messages = protocol.encode(
            MessageKind::Note,
            &[
                update(0, 81, 5, Rgb::BLACK),
                update(1, 82, 6, Rgb::BLACK),
                update(2, 83, 7, Rgb::BLACK),
            ],
        );
        assert_eq!(
            messages,
            vec![
                vec![240, 0, 32, 41, 2, 13, 3, 0, 81, 5, 0, 82, 6, 247],
                vec![240, 0, 32, 41, 2, 13, 3, 0, 83, 7, 247],
            ]
        );
    }

    #[test]
    fn rgb_sysex_carries_length_and_seven_bit_color() {
        let protocol = PadProtocol::SysexRgb {
            header: Cow::Borrowed(&[0xF0, 0x47, 0x7F, 0x43]),
            command: 0x65,
            addressing: LedAddressing::LogicalIndex,
            max_entries: 64,
        };
        let messages = protocol.encode(
            MessageKind::Note,
            &[
                update(10, 64, 5, Rgb::new(255, 0, 128)),
                update(11, 65, 0, Rgb::BLACK),
            ],
        );
        assert_eq!(
            messages,
            vec![vec![
                0xF0, 0x47, 0x7F, 0x43, 0x65, 0, 8, 10, 127, 0, 64, 11, 0, 0, 0, 0xF7
            ]]
        );
    }

    #[test]
    fn nothing_to_encode() {
        assert!(PadProtocol::ShortMessage
            .encode(MessageKind::Note, &[])
            .is_empty());
    }
}
