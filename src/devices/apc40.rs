//! Akai APC40 in Ableton mode: a 5x8 clip grid with one MIDI channel per track, lit with plain
//! note messages.

use std::borrow::Cow;
use std::time::Duration;

use crate::{
    semantic, Axis, ButtonBinding, ButtonId, ColorRegistry, ControlMap, HardwareAddress,
    KnobBinding, KnobEncoding, MessageKind, PadMap, PadProtocol, Rgb, SurfaceConfig,
};

pub const CHANNEL_COUNT: u8 = 8;

/// Switches the unit into Ableton mode, where every LED is under host control
const ABLETON_MODE: [u8; 12] = [
    0xF0, 0x47, 0x7F, 0x73, 0x60, 0x00, 0x04, 0x41, 0x08, 0x02, 0x01, 0xF7,
];
/// Back to generic mode, where the unit lights its own LEDs
const GENERIC_MODE: [u8; 12] = [
    0xF0, 0x47, 0x7F, 0x73, 0x60, 0x00, 0x04, 0x40, 0x08, 0x02, 0x01, 0xF7,
];

const CLIP_LAUNCH: u8 = 0x35;
const CLIP_STOP: u8 = 0x34;
const TRACK_SELECT: u8 = 0x33;
const SCENE_LAUNCH: u8 = 0x52;
const FADER: u8 = 0x07;
const TRACK_KNOB: u8 = 0x30;
const DEVICE_KNOB: u8 = 0x10;

/// Scene launch buttons, top to bottom: `SCENE + 0` .. `SCENE + 4`
pub const SCENE: ButtonId = 0;
pub const STOP_ALL: ButtonId = 5;
pub const SHIFT: ButtonId = 6;
pub const PLAY: ButtonId = 7;
pub const STOP: ButtonId = 8;
pub const RECORD: ButtonId = 9;
/// Per-track clip stop buttons: `TRACK_STOP + track`
pub const TRACK_STOP: ButtonId = 16;
/// Per-track select buttons: `TRACK_SELECTED + track`
pub const TRACK_SELECTED: ButtonId = 24;

/// Track knobs are `0..8`, device knobs `8..16` and faders `16..24`
pub const FIRST_DEVICE_KNOB: u8 = 8;
pub const FIRST_FADER: u8 = 16;

/// LED values understood by the clip grid and the scene buttons
pub mod led {
    pub const OFF: u8 = 0;
    pub const GREEN: u8 = 1;
    pub const GREEN_BLINK: u8 = 2;
    pub const RED: u8 = 3;
    pub const RED_BLINK: u8 = 4;
    pub const YELLOW: u8 = 5;
    pub const YELLOW_BLINK: u8 = 6;
}

fn note_button(id: ButtonId, channel: u8, code: u8, lit: bool) -> ButtonBinding {
    ButtonBinding {
        id,
        kind: MessageKind::Note,
        address: HardwareAddress::new(channel, code),
        light: if lit { Some(MessageKind::Note) } else { None },
    }
}

fn buttons() -> Vec<ButtonBinding> {
    let mut buttons: Vec<ButtonBinding> = (0..5)
        .map(|row| note_button(SCENE + row, 0, SCENE_LAUNCH + row, true))
        .collect();
    buttons.push(note_button(STOP_ALL, 0, 0x51, true));
    buttons.push(note_button(SHIFT, 0, 0x62, false));
    buttons.push(note_button(PLAY, 0, 0x5B, false));
    buttons.push(note_button(STOP, 0, 0x5C, false));
    buttons.push(note_button(RECORD, 0, 0x5D, false));

    for track in 0..CHANNEL_COUNT {
        buttons.push(note_button(TRACK_STOP + track, track, CLIP_STOP, true));
        buttons.push(note_button(TRACK_SELECTED + track, track, TRACK_SELECT, true));
    }
    buttons
}

fn knobs() -> Vec<KnobBinding> {
    let absolute = |index, channel, code| KnobBinding {
        index,
        address: HardwareAddress::new(channel, code),
        encoding: KnobEncoding::Absolute,
        touch: None,
    };

    (0..CHANNEL_COUNT)
        .map(|i| absolute(i, 0, TRACK_KNOB + i))
        .chain((0..CHANNEL_COUNT).map(|i| absolute(FIRST_DEVICE_KNOB + i, 0, DEVICE_KNOB + i)))
        .chain((0..CHANNEL_COUNT).map(|track| absolute(FIRST_FADER + track, track, FADER)))
        .collect()
}

pub fn colors() -> ColorRegistry {
    let mut colors = ColorRegistry::new();
    colors.register_palette(led::GREEN, Rgb::new(0, 255, 0));
    colors.register_palette(led::RED, Rgb::new(255, 0, 0));
    colors.register_palette(led::YELLOW, Rgb::new(255, 200, 0));

    colors.register_color(semantic::ON, led::GREEN);
    colors.register_color(semantic::DIM, led::YELLOW);
    colors.register_color(semantic::SELECTED, led::RED);
    colors.register_color(semantic::PAD_HAS_CONTENT, led::YELLOW);
    colors.register_color(semantic::STEP_SELECTED, led::RED);
    colors.register_color(semantic::PLAYING, led::GREEN);
    colors.register_color(semantic::RECORDING, led::RED);
    colors.register_color(semantic::MUTED, led::YELLOW);
    colors
}

pub fn pads() -> PadMap {
    PadMap::Channelled {
        rows: 5,
        columns: CHANNEL_COUNT,
        first_channel: 0,
        first: CLIP_LAUNCH,
        channel_axis: Axis::Column,
    }
}

pub fn apc40() -> SurfaceConfig {
    SurfaceConfig {
        name: Cow::Borrowed("Akai APC40"),
        port_keyword: Cow::Borrowed("APC40"),
        controls: ControlMap {
            pads: pads(),
            pad_kind: MessageKind::Note,
            buttons: Cow::Owned(buttons()),
            knobs: Cow::Owned(knobs()),
        },
        pad_protocol: PadProtocol::ShortMessage,
        colors: colors(),
        display: None,
        blink_period: Duration::from_millis(600),
        greeting: vec![Cow::Borrowed(&ABLETON_MODE)],
        goodbye: vec![Cow::Borrowed(&GENERIC_MODE)],
    }
}
