//! Akai Professional Fire: 4x16 RGB pads, four touch-sensitive encoders plus a select encoder,
//! single-color button LEDs, and a 128x64 monochrome OLED.

use std::borrow::Cow;
use std::time::Duration;

use super::button;
use crate::{
    semantic, ButtonBinding, ButtonId, ColorRegistry, ControlMap, HardwareAddress, KnobBinding,
    KnobEncoding, LedAddressing, PadMap, PadProtocol, Rgb, StripeLayout,
    SurfaceConfig, TilePermutation,
};

use crate::MessageKind::{ControlChange as Cc, Note};

const SYSEX_HEADER: [u8; 4] = [0xF0, 0x47, 0x7F, 0x43];
const SET_PAD_COLORS: u8 = 0x65;
const WRITE_OLED: u8 = 0x0E;

// Buttons are identified by the note they send; their LED is the CC with the same number
pub const SELECT: ButtonId = 0x19;
pub const MODE: ButtonId = 0x1A;
pub const PATTERN_UP: ButtonId = 0x1F;
pub const PATTERN_DOWN: ButtonId = 0x20;
pub const BROWSER: ButtonId = 0x21;
pub const GRID_LEFT: ButtonId = 0x22;
pub const GRID_RIGHT: ButtonId = 0x23;
pub const MUTE_1: ButtonId = 0x24;
pub const MUTE_2: ButtonId = 0x25;
pub const MUTE_3: ButtonId = 0x26;
pub const MUTE_4: ButtonId = 0x27;
pub const STEP: ButtonId = 0x2C;
pub const NOTE: ButtonId = 0x2D;
pub const DRUM: ButtonId = 0x2E;
pub const PERFORM: ButtonId = 0x2F;
pub const SHIFT: ButtonId = 0x30;
pub const ALT: ButtonId = 0x31;
pub const PATTERN: ButtonId = 0x32;
pub const PLAY: ButtonId = 0x33;
pub const STOP: ButtonId = 0x34;
pub const RECORD: ButtonId = 0x35;

/// Button LED values. Most buttons only know a subset.
pub mod led {
    pub const OFF: u8 = 0;
    pub const DULL_RED: u8 = 1;
    pub const DULL_GREEN: u8 = 2;
    pub const HIGH_RED: u8 = 3;
    pub const HIGH_GREEN: u8 = 4;
}

const BUTTONS: [ButtonBinding; 21] = [
    button(SELECT, Note, SELECT, None),
    button(MODE, Note, MODE, None),
    button(PATTERN_UP, Note, PATTERN_UP, Some(Cc)),
    button(PATTERN_DOWN, Note, PATTERN_DOWN, Some(Cc)),
    button(BROWSER, Note, BROWSER, Some(Cc)),
    button(GRID_LEFT, Note, GRID_LEFT, Some(Cc)),
    button(GRID_RIGHT, Note, GRID_RIGHT, Some(Cc)),
    button(MUTE_1, Note, MUTE_1, Some(Cc)),
    button(MUTE_2, Note, MUTE_2, Some(Cc)),
    button(MUTE_3, Note, MUTE_3, Some(Cc)),
    button(MUTE_4, Note, MUTE_4, Some(Cc)),
    button(STEP, Note, STEP, Some(Cc)),
    button(NOTE, Note, NOTE, Some(Cc)),
    button(DRUM, Note, DRUM, Some(Cc)),
    button(PERFORM, Note, PERFORM, Some(Cc)),
    button(SHIFT, Note, SHIFT, Some(Cc)),
    button(ALT, Note, ALT, Some(Cc)),
    button(PATTERN, Note, PATTERN, Some(Cc)),
    button(PLAY, Note, PLAY, Some(Cc)),
    button(STOP, Note, STOP, Some(Cc)),
    button(RECORD, Note, RECORD, Some(Cc)),
];

const fn knob(index: u8, code: u8, touch: Option<HardwareAddress>) -> KnobBinding {
    KnobBinding {
        index,
        address: HardwareAddress::new(0, code),
        encoding: KnobEncoding::TwosComplement,
        touch,
    }
}

pub const VOLUME_KNOB: u8 = 0;
pub const PAN_KNOB: u8 = 1;
pub const FILTER_KNOB: u8 = 2;
pub const RESONANCE_KNOB: u8 = 3;
pub const SELECT_KNOB: u8 = 4;

const KNOBS: [KnobBinding; 5] = [
    knob(VOLUME_KNOB, 0x10, Some(HardwareAddress::new(0, 0x10))),
    knob(PAN_KNOB, 0x11, Some(HardwareAddress::new(0, 0x11))),
    knob(FILTER_KNOB, 0x12, Some(HardwareAddress::new(0, 0x12))),
    knob(RESONANCE_KNOB, 0x13, Some(HardwareAddress::new(0, 0x13))),
    knob(SELECT_KNOB, 0x76, None),
];

/// `BIT_MUTATE[y][x]` is the destination bit of pixel `(x, y)` within a 7x8 tile of the OLED.
/// Each column of the tile fills a run of destination bits from the top down.
const BIT_MUTATE: [[u8; 7]; 8] = [
    [13, 19, 25, 31, 37, 43, 49],
    [0, 20, 26, 32, 38, 44, 50],
    [1, 7, 27, 33, 39, 45, 51],
    [2, 8, 14, 34, 40, 46, 52],
    [3, 9, 15, 21, 41, 47, 53],
    [4, 10, 16, 22, 28, 48, 54],
    [5, 11, 17, 23, 29, 35, 55],
    [6, 12, 18, 24, 30, 36, 42],
];

const fn invert(mutate: [[u8; 7]; 8]) -> [(u8, u8); 56] {
    let mut sources = [(0, 0); 56];
    let mut y = 0;
    while y < 8 {
        let mut x = 0;
        while x < 7 {
            sources[mutate[y][x] as usize] = (x as u8, y as u8);
            x += 1;
        }
        y += 1;
    }
    sources
}

static TILE_SOURCES: [(u8, u8); 56] = invert(BIT_MUTATE);

/// The OLED: eight stripes of 8 rows, 147 payload bytes each
pub fn display_layout() -> StripeLayout {
    StripeLayout {
        width: 128,
        stripes: 8,
        tile: TilePermutation {
            width: 7,
            height: 8,
            sources: Cow::Borrowed(&TILE_SOURCES),
        },
        header: Cow::Borrowed(&SYSEX_HEADER),
        command: WRITE_OLED,
        keep_alive: Duration::from_millis(3000),
    }
}

/// The pads take any RGB color; this is the set the registry hands out
pub const PALETTE: [Rgb; 10] = [
    Rgb::BLACK,
    Rgb::WHITE,
    Rgb::new(40, 40, 40),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(0, 0, 255),
    Rgb::new(255, 200, 0),
    Rgb::new(255, 80, 0),
    Rgb::new(0, 200, 255),
    Rgb::new(60, 0, 0),
];

pub fn colors() -> ColorRegistry {
    let mut colors = ColorRegistry::with_palette(&PALETTE);
    colors.register_color(semantic::ON, 1);
    colors.register_color(semantic::DIM, 2);
    colors.register_color(semantic::RECORDING, 3);
    colors.register_color(semantic::PLAYING, 4);
    colors.register_color(semantic::SELECTED, 5);
    colors.register_color(semantic::STEP_SELECTED, 6);
    colors.register_color(semantic::PAD_HAS_CONTENT, 8);
    colors.register_color(semantic::MUTED, 9);
    colors
}

pub fn pads() -> PadMap {
    PadMap::Linear {
        rows: 4,
        columns: 16,
        channel: 0,
        first: 54,
        row_stride: 16,
        bottom_up: false,
    }
}

pub fn fire() -> SurfaceConfig {
    SurfaceConfig {
        name: Cow::Borrowed("Akai Fire"),
        port_keyword: Cow::Borrowed("FL STUDIO FIRE"),
        controls: ControlMap {
            pads: pads(),
            pad_kind: Note,
            buttons: Cow::Borrowed(&BUTTONS),
            knobs: Cow::Borrowed(&KNOBS),
        },
        pad_protocol: PadProtocol::SysexRgb {
            header: Cow::Borrowed(&SYSEX_HEADER),
            command: SET_PAD_COLORS,
            addressing: LedAddressing::LogicalIndex,
            max_entries: 64,
        },
        colors: colors(),
        display: Some(display_layout()),
        blink_period: Duration::from_millis(600),
        greeting: Vec::new(),
        goodbye: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoordinateTranslator, InputEvent, KnobChange};

    #[test]
    fn pads_count_from_the_top_left() {
        let pads = pads();
        assert_eq!(pads.validate(), Ok(()));
        assert_eq!(pads.to_hardware(0), Some(HardwareAddress::new(0, 54)));
        assert_eq!(pads.to_hardware(63), Some(HardwareAddress::new(0, 117)));
        assert_eq!(pads.index(1, 0), Some(16));
    }

    #[test]
    fn tile_table_is_the_inverse() {
        for (y, row) in BIT_MUTATE.iter().enumerate() {
            for (x, &bit) in row.iter().enumerate() {
                assert_eq!(TILE_SOURCES[bit as usize], (x as u8, y as u8));
            }
        }
        assert_eq!(display_layout().payload_len(), 147);
    }

    #[test]
    fn tile_columns_pack_downwards() {
        assert_eq!(BIT_MUTATE[0][0], 13);
        assert_eq!(TILE_SOURCES[0], (0, 1));
        assert_eq!(TILE_SOURCES[6], (0, 7));
        assert_eq!(TILE_SOURCES[19], (1, 0));
        assert_eq!(TILE_SOURCES[7], (1, 2));
        assert_eq!(TILE_SOURCES[55], (6, 6));

        // The two leftover columns of a 128 pixel stripe only need the first 21 bits of a tile
        for (bit, &(x, _)) in TILE_SOURCES.iter().enumerate() {
            if x < 2 {
                assert!(bit < 21, "bit {} holds column {}", bit, x);
            }
        }
    }

    #[test]
    fn second_row_pixel_lands_on_the_first_bit() {
        let layout = display_layout();
        let mut bitmap = layout.bitmap();
        bitmap.set(0, 1, true);
        let payload = layout.encode_stripe(&bitmap, 0);
        assert_eq!(payload[0], 1);
        assert_eq!(payload.iter().filter(|&&byte| byte != 0).count(), 1);

        bitmap.clear();
        bitmap.set(1, 0, true);
        let payload = layout.encode_stripe(&bitmap, 0);
        // Bit 19 is byte 2, bit 5
        assert_eq!(payload[2], 1 << 5);
        assert_eq!(payload.iter().filter(|&&byte| byte != 0).count(), 1);
    }

    #[test]
    fn decodes_its_controls() {
        let fire = fire();
        assert_eq!(
            fire.decode(&[0x90, 0x30, 127]),
            Some(InputEvent::Button { id: SHIFT, pressed: true })
        );
        assert_eq!(
            fire.decode(&[0xB0, 0x76, 0x7F]),
            Some(InputEvent::Knob { index: SELECT_KNOB, change: KnobChange::Relative(-1) })
        );
        assert_eq!(
            fire.decode(&[0x90, 0x11, 127]),
            Some(InputEvent::KnobTouch { index: PAN_KNOB, touched: true })
        );
        assert_eq!(
            fire.decode(&[0x80, 70, 0]),
            Some(InputEvent::Pad { index: 16, velocity: 0 })
        );
    }
}
