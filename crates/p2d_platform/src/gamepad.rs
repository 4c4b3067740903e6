//! Physical gamepad polling through gilrs.
//!
//! gilrs keeps a cached state per pad that only advances while its event
//! queue is drained, so `poll` must run once per redraw before simulation.
//! The first connected pad drives the game; others are ignored.

use gilrs::{Axis, Button, EventType, Gamepad, Gilrs};
use p2d_core::input::GamepadState;

/// The controls the game reads from one pad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PadReading {
    pub left_stick_x: f32,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub south: bool,
    pub select: bool,
}

impl PadReading {
    fn from_gamepad(pad: &Gamepad<'_>) -> Self {
        Self {
            left_stick_x: pad.value(Axis::LeftStickX),
            dpad_left: pad.is_pressed(Button::DPadLeft),
            dpad_right: pad.is_pressed(Button::DPadRight),
            south: pad.is_pressed(Button::South),
            select: pad.is_pressed(Button::Select),
        }
    }
}

impl From<PadReading> for GamepadState {
    fn from(reading: PadReading) -> Self {
        Self {
            connected: true,
            left_stick_x: reading.left_stick_x.clamp(-1.0, 1.0),
            dpad_left: reading.dpad_left,
            dpad_right: reading.dpad_right,
            button_a: reading.south,
            button_back: reading.select,
        }
    }
}

pub struct GamepadPoller {
    gilrs: Option<Gilrs>,
}

impl GamepadPoller {
    /// Start gilrs. A platform without gamepad support leaves the poller
    /// permanently disconnected.
    pub fn new() -> Self {
        match Gilrs::new() {
            Ok(gilrs) => {
                for (id, pad) in gilrs.gamepads() {
                    log::info!("Gamepad {id} found: {}", pad.name());
                }
                Self { gilrs: Some(gilrs) }
            }
            Err(err) => {
                log::warn!("Gamepad support unavailable: {err}");
                Self { gilrs: None }
            }
        }
    }

    /// Drain pending events and report the first connected pad.
    pub fn poll(&mut self) -> GamepadState {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return GamepadState::default();
        };

        while let Some(event) = gilrs.next_event() {
            match event.event {
                EventType::Connected => log::info!("Gamepad {} connected", event.id),
                EventType::Disconnected => log::info!("Gamepad {} disconnected", event.id),
                _ => {}
            }
        }

        gilrs
            .gamepads()
            .find(|(_, pad)| pad.is_connected())
            .map(|(_, pad)| GamepadState::from(PadReading::from_gamepad(&pad)))
            .unwrap_or_default()
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_maps_south_to_a_and_select_to_back() {
        let state = GamepadState::from(PadReading {
            south: true,
            select: true,
            ..Default::default()
        });
        assert!(state.connected);
        assert!(state.button_a);
        assert!(state.button_back);
        assert!(!state.dpad_left && !state.dpad_right);
    }

    #[test]
    fn reading_clamps_stick_and_keeps_dpad() {
        let state = GamepadState::from(PadReading {
            left_stick_x: -1.4,
            dpad_right: true,
            ..Default::default()
        });
        assert_eq!(state.left_stick_x, -1.0);
        assert!(state.dpad_right);
        assert!(!state.button_a);
    }
}
