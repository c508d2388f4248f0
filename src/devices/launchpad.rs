//! Novation Launchpad Mini MK3 in programmer mode

use std::borrow::Cow;
use std::time::Duration;

use super::button;
use crate::{
    semantic, ButtonBinding, ButtonId, ColorRegistry, ControlMap, LedAddressing, MessageKind,
    PadMap, PadProtocol, Rgb, SurfaceConfig,
};

use crate::MessageKind::ControlChange as Cc;

const SYSEX_HEADER: [u8; 6] = [240, 0, 32, 41, 2, 13];
const PROGRAMMER_MODE: [u8; 9] = [240, 0, 32, 41, 2, 13, 14, 1, 247];
const LIVE_MODE: [u8; 9] = [240, 0, 32, 41, 2, 13, 14, 0, 247];

pub const UP: ButtonId = 0;
pub const DOWN: ButtonId = 1;
pub const LEFT: ButtonId = 2;
pub const RIGHT: ButtonId = 3;
pub const SESSION: ButtonId = 4;
pub const DRUMS: ButtonId = 5;
pub const KEYS: ButtonId = 6;
pub const USER: ButtonId = 7;
/// The right column, top to bottom: `SCENE + 0` .. `SCENE + 7`
pub const SCENE: ButtonId = 8;
/// The bottom right button
pub const STOP_SOLO_MUTE: ButtonId = SCENE + 7;

const BUTTONS: [ButtonBinding; 16] = [
    button(UP, Cc, 91, Some(Cc)),
    button(DOWN, Cc, 92, Some(Cc)),
    button(LEFT, Cc, 93, Some(Cc)),
    button(RIGHT, Cc, 94, Some(Cc)),
    button(SESSION, Cc, 95, Some(Cc)),
    button(DRUMS, Cc, 96, Some(Cc)),
    button(KEYS, Cc, 97, Some(Cc)),
    button(USER, Cc, 98, Some(Cc)),
    button(SCENE, Cc, 89, Some(Cc)),
    button(SCENE + 1, Cc, 79, Some(Cc)),
    button(SCENE + 2, Cc, 69, Some(Cc)),
    button(SCENE + 3, Cc, 59, Some(Cc)),
    button(SCENE + 4, Cc, 49, Some(Cc)),
    button(SCENE + 5, Cc, 39, Some(Cc)),
    button(SCENE + 6, Cc, 29, Some(Cc)),
    button(STOP_SOLO_MUTE, Cc, 19, Some(Cc)),
];

pub fn colors() -> ColorRegistry {
    let mut colors = ColorRegistry::new();
    for &(index, rgb) in [
        (1, Rgb::new(30, 30, 30)),
        (2, Rgb::new(127, 127, 127)),
        (3, Rgb::WHITE),
        (5, Rgb::new(255, 0, 0)),
        (9, Rgb::new(255, 84, 0)),
        (13, Rgb::new(255, 255, 0)),
        (21, Rgb::new(0, 255, 0)),
        (45, Rgb::new(0, 0, 255)),
        (53, Rgb::new(255, 0, 255)),
        (90, Rgb::new(0, 255, 255)),
    ]
    .iter()
    {
        colors.register_palette(index, rgb);
    }

    colors.register_color(semantic::ON, 3);
    colors.register_color(semantic::DIM, 1);
    colors.register_color(semantic::SELECTED, 5);
    colors.register_color(semantic::PAD_HAS_CONTENT, 45);
    colors.register_color(semantic::STEP_SELECTED, 13);
    colors.register_color(semantic::PLAYING, 21);
    colors.register_color(semantic::RECORDING, 5);
    colors.register_color(semantic::MUTED, 2);
    colors
}

pub fn pads() -> PadMap {
    PadMap::Linear {
        rows: 8,
        columns: 8,
        channel: 0,
        first: 11,
        row_stride: 10,
        bottom_up: true,
    }
}

pub fn mini_mk3() -> SurfaceConfig {
    let mut lighting_header = SYSEX_HEADER.to_vec();
    lighting_header.push(3);

    SurfaceConfig {
        name: Cow::Borrowed("Launchpad Mini MK3"),
        port_keyword: Cow::Borrowed("LPMiniMK3 MIDI"),
        controls: ControlMap {
            pads: pads(),
            pad_kind: MessageKind::Note,
            buttons: Cow::Borrowed(&BUTTONS),
            knobs: Cow::Borrowed(&[]),
        },
        pad_protocol: PadProtocol::SysexPalette {
            header: Cow::Owned(lighting_header),
            // Lighting type 0: static palette color
            entry_prefix: Cow::Borrowed(&[0]),
            addressing: LedAddressing::Hardware,
            max_entries: 81,
        },
        colors: colors(),
        display: None,
        blink_period: Duration::from_millis(600),
        greeting: vec![Cow::Borrowed(&PROGRAMMER_MODE)],
        goodbye: vec![Cow::Borrowed(&LIVE_MODE)],
    }
}
