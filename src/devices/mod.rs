//! Built-in hardware definitions.
//!
//! Each one is plain configuration data: pad map, buttons, knobs, colors, LED protocol, and the
//! display layout if there is one. Nothing here contains behavior; the generic runtime in
//! [`crate::surface`] does all the work.

pub mod apc40;
pub mod fire;
pub mod launchpad;

use crate::{ButtonBinding, ButtonId, HardwareAddress, MessageKind, SurfaceConfig};

/// A button on channel 0 whose LED, if any, sits at the same address
pub(crate) const fn button(
    id: ButtonId,
    kind: MessageKind,
    code: u8,
    light: Option<MessageKind>,
) -> ButtonBinding {
    ButtonBinding {
        id,
        kind,
        address: HardwareAddress::new(0, code),
        light,
    }
}

/// Every built-in definition
pub fn all() -> Vec<SurfaceConfig> {
    vec![fire::fire(), launchpad::mini_mk3(), apc40::apc40()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic;

    #[test]
    fn built_in_definitions_are_valid() {
        for config in all() {
            assert_eq!(config.validate(), Ok(()), "{}", config.name);
        }
    }

    #[test]
    fn built_in_definitions_know_the_shared_colors() {
        let shared = [
            semantic::OFF,
            semantic::ON,
            semantic::DIM,
            semantic::SELECTED,
            semantic::PAD_HAS_CONTENT,
            semantic::STEP_SELECTED,
            semantic::PLAYING,
            semantic::RECORDING,
            semantic::MUTED,
        ];
        for config in all() {
            for id in shared.iter() {
                assert!(config.colors.is_registered(id), "{} lacks {}", config.name, id);
            }
        }
    }

    #[test]
    fn timing_is_per_device() {
        for config in all() {
            assert_eq!(config.blink_period, std::time::Duration::from_millis(600));
        }
        let fire = fire::fire();
        let display = fire.display.as_ref().map(|display| display.keep_alive);
        assert_eq!(display, Some(std::time::Duration::from_millis(3000)));
    }
}
