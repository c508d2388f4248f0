use std::borrow::Cow;
use std::convert::TryFrom;

use super::{CoordinateTranslator, HardwareAddress};

/// Which grid axis selects the MIDI channel in [`PadMap::Channelled`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Row,
    Column,
}

/// The pad layouts found on common grid controllers.
///
/// Logical index `i` is the pad in row `i / columns`, column `i % columns`, with row 0 at the top.
///
/// ```
/// # use surfacekit::{PadMap, CoordinateTranslator, HardwareAddress};
/// // Launchpad style: bottom-left pad is note 11, each row up adds 10
/// let map = PadMap::Linear { rows: 8, columns: 8, channel: 0, first: 11, row_stride: 10, bottom_up: true };
///
/// assert_eq!(map.to_hardware(0), Some(HardwareAddress::new(0, 81))); // top left
/// assert_eq!(map.to_logical(HardwareAddress::new(0, 18)), Some(63)); // bottom right
/// assert_eq!(map.to_logical(HardwareAddress::new(0, 19)), None); // side button, not a pad
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PadMap {
    /// `code = first + physical_row * row_stride + column`, all on one channel. With
    /// `bottom_up`, physical row 0 is the bottom row.
    Linear {
        rows: u8,
        columns: u8,
        channel: u8,
        first: u8,
        row_stride: u8,
        bottom_up: bool,
    },
    /// An explicit code for every logical index, all on one channel
    Table {
        channel: u8,
        columns: u8,
        codes: Cow<'static, [u8]>,
    },
    /// One MIDI channel per row (or column); the other axis counts up from `first`
    Channelled {
        rows: u8,
        columns: u8,
        first_channel: u8,
        first: u8,
        channel_axis: Axis,
    },
    /// Column-major numbering: `code = first + column * rows + row`
    Transposed {
        rows: u8,
        columns: u8,
        channel: u8,
        first: u8,
    },
}

impl PadMap {
    pub fn columns(&self) -> u8 {
        match *self {
            Self::Linear { columns, .. } => columns,
            Self::Table { columns, .. } => columns,
            Self::Channelled { columns, .. } => columns,
            Self::Transposed { columns, .. } => columns,
        }
    }

    pub fn rows(&self) -> u8 {
        match self {
            Self::Linear { rows, .. } => *rows,
            Self::Table { columns, codes, .. } => {
                if *columns == 0 {
                    0
                } else {
                    ((codes.len() + *columns as usize - 1) / *columns as usize) as u8
                }
            }
            Self::Channelled { rows, .. } => *rows,
            Self::Transposed { rows, .. } => *rows,
        }
    }

    /// The logical index of the pad at `(row, column)`, or None if out of bounds
    pub fn index(&self, row: u8, column: u8) -> Option<u8> {
        let index = row as u16 * self.columns() as u16 + column as u16;
        if column < self.columns() && index < self.len() as u16 {
            Some(index as u8)
        } else {
            None
        }
    }

    /// The `(row, column)` position of a logical index
    pub fn position(&self, index: u8) -> Option<(u8, u8)> {
        let columns = self.columns();
        if columns == 0 || index >= self.len() {
            return None;
        }
        Some((index / columns, index % columns))
    }
}

impl CoordinateTranslator for PadMap {
    fn len(&self) -> u8 {
        match self {
            Self::Table { codes, .. } => codes.len().min(u8::MAX as usize) as u8,
            _ => (self.rows() as u16 * self.columns() as u16).min(u8::MAX as u16) as u8,
        }
    }

    fn to_hardware(&self, index: u8) -> Option<HardwareAddress> {
        let (row, column) = self.position(index)?;

        let address = match self {
            &Self::Linear {
                rows,
                channel,
                first,
                row_stride,
                bottom_up,
                ..
            } => {
                let physical_row = if bottom_up { rows - 1 - row } else { row };
                let code = first as u16 + physical_row as u16 * row_stride as u16 + column as u16;
                HardwareAddress::new(channel, u8::try_from(code).ok()?)
            }
            Self::Table { channel, codes, .. } => {
                HardwareAddress::new(*channel, *codes.get(index as usize)?)
            }
            &Self::Channelled {
                first_channel,
                first,
                channel_axis,
                ..
            } => match channel_axis {
                Axis::Row => {
                    HardwareAddress::new(first_channel.checked_add(row)?, first.checked_add(column)?)
                }
                Axis::Column => {
                    HardwareAddress::new(first_channel.checked_add(column)?, first.checked_add(row)?)
                }
            },
            &Self::Transposed {
                rows,
                channel,
                first,
                ..
            } => {
                let code = first as u16 + column as u16 * rows as u16 + row as u16;
                HardwareAddress::new(channel, u8::try_from(code).ok()?)
            }
        };
        Some(address)
    }

    fn to_logical(&self, address: HardwareAddress) -> Option<u8> {
        match self {
            &Self::Linear {
                rows,
                columns,
                channel,
                first,
                row_stride,
                bottom_up,
            } => {
                if address.channel != channel || row_stride == 0 {
                    return None;
                }
                let offset = address.code.checked_sub(first)?;
                let physical_row = offset / row_stride;
                let column = offset % row_stride;
                if physical_row >= rows || column >= columns {
                    return None;
                }
                let row = if bottom_up {
                    rows - 1 - physical_row
                } else {
                    physical_row
                };
                self.index(row, column)
            }
            Self::Table { channel, codes, .. } => {
                if address.channel != *channel {
                    return None;
                }
                let position = codes.iter().position(|&code| code == address.code)?;
                u8::try_from(position).ok()
            }
            &Self::Channelled {
                rows,
                columns,
                first_channel,
                first,
                channel_axis,
            } => {
                let along_channel = address.channel.checked_sub(first_channel)?;
                let along_code = address.code.checked_sub(first)?;
                let (row, column) = match channel_axis {
                    Axis::Row => (along_channel, along_code),
                    Axis::Column => (along_code, along_channel),
                };
                if row >= rows || column >= columns {
                    return None;
                }
                self.index(row, column)
            }
            &Self::Transposed {
                rows,
                columns,
                channel,
                first,
            } => {
                if address.channel != channel || rows == 0 {
                    return None;
                }
                let offset = address.code.checked_sub(first)?;
                let (column, row) = (offset / rows, offset % rows);
                if column >= columns {
                    return None;
                }
                self.index(row, column)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigError;

    fn all_kinds() -> Vec<PadMap> {
        vec![
            PadMap::Linear {
                rows: 8,
                columns: 8,
                channel: 0,
                first: 11,
                row_stride: 10,
                bottom_up: true,
            },
            PadMap::Linear {
                rows: 4,
                columns: 16,
                channel: 0,
                first: 54,
                row_stride: 16,
                bottom_up: false,
            },
            PadMap::Table {
                channel: 9,
                columns: 4,
                codes: Cow::Borrowed(&[36, 37, 38, 39, 44, 45, 46, 47, 40, 41, 42, 43, 48, 49, 50, 51]),
            },
            PadMap::Channelled {
                rows: 5,
                columns: 8,
                first_channel: 0,
                first: 0x35,
                channel_axis: Axis::Column,
            },
            PadMap::Channelled {
                rows: 4,
                columns: 4,
                first_channel: 2,
                first: 60,
                channel_axis: Axis::Row,
            },
            PadMap::Transposed {
                rows: 8,
                columns: 8,
                channel: 0,
                first: 0,
            },
        ]
    }

    #[test]
    fn every_layout_round_trips() {
        for map in all_kinds() {
            assert_eq!(map.validate(), Ok(()), "{:?}", map);
            for index in 0..map.len() {
                let address = map.to_hardware(index).unwrap();
                assert_eq!(map.to_logical(address), Some(index), "{:?}", map);
            }
        }
    }

    #[test]
    fn out_of_range_is_none() {
        for map in all_kinds() {
            assert_eq!(map.to_hardware(map.len()), None);
        }
    }

    #[test]
    fn stride_gaps_are_not_pads() {
        let map = &all_kinds()[0];
        // 19, 29, ... are the side buttons on a Launchpad
        for code in (19..=89).step_by(10) {
            assert_eq!(map.to_logical(HardwareAddress::new(0, code)), None);
        }
        // Right code, wrong channel
        assert_eq!(map.to_logical(HardwareAddress::new(1, 11)), None);
    }

    #[test]
    fn channel_per_column() {
        let map = &all_kinds()[3];
        // Row 2, column 6
        let index = map.index(2, 6).unwrap();
        assert_eq!(map.to_hardware(index), Some(HardwareAddress::new(6, 0x37)));
    }

    #[test]
    fn transposed_counts_down_columns() {
        let map = &all_kinds()[5];
        assert_eq!(map.to_hardware(1), Some(HardwareAddress::new(0, 8)));
        assert_eq!(map.to_hardware(8), Some(HardwareAddress::new(0, 1)));
    }

    #[test]
    fn broken_tables_are_caught() {
        let duplicate = PadMap::Table {
            channel: 0,
            columns: 2,
            codes: Cow::Borrowed(&[1, 2, 2, 3]),
        };
        assert_eq!(
            duplicate.validate(),
            Err(ConfigError::DuplicateAddress { channel: 0, code: 2 })
        );

        // A stride narrower than the row makes neighbouring rows overlap
        let overlapping = PadMap::Linear {
            rows: 2,
            columns: 8,
            channel: 0,
            first: 0,
            row_stride: 4,
            bottom_up: false,
        };
        assert!(overlapping.validate().is_err());

        let too_high = PadMap::Linear {
            rows: 8,
            columns: 8,
            channel: 0,
            first: 100,
            row_stride: 8,
            bottom_up: false,
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn channelled_overflow_is_an_error() {
        let overflowing = PadMap::Channelled {
            rows: 8,
            columns: 1,
            first_channel: 0,
            first: 250,
            channel_axis: Axis::Column,
        };
        assert_eq!(overflowing.to_hardware(7), None);
        assert!(overflowing.validate().is_err());

        let too_many_channels = PadMap::Channelled {
            rows: 1,
            columns: 8,
            first_channel: 252,
            first: 0,
            channel_axis: Axis::Column,
        };
        assert_eq!(too_many_channels.to_hardware(5), None);
        assert!(too_many_channels.validate().is_err());
    }
}
