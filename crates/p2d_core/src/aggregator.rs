//! Folds every input source into one immutable per-frame snapshot.
//!
//! Sources overlap on purpose: the keyboard, physical gamepad, virtual
//! gamepad and accelerometer can all move the player, and they are OR'ed
//! (or, for the analog axis, overridden by digital input) into a single
//! logical control set. Gameplay code only ever sees `InputSnapshot`.

use glam::{Vec2, Vec3};

use crate::input::{InputState, Key};
use crate::render::LOGICAL_SIZE;
use crate::virtual_pad::{VirtualButtons, VirtualGamePad};

/// Stick values below this are treated as centred.
const STICK_DEAD_ZONE: f32 = 0.5;
/// Tilt (in g) below this is treated as level.
const TILT_DEAD_ZONE: f32 = 0.1;
const ACCELEROMETER_SCALE: f32 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot {
    /// Horizontal intent in `[-1, 1]`.
    pub move_x: f32,
    pub jump_held: bool,
    /// Unified "continue / confirm" signal, level-triggered.
    pub continue_held: bool,
    pub back_held: bool,
    pub virtual_buttons: VirtualButtons,
    /// Active touches in logical coordinates.
    pub touches: Vec<Vec2>,
    pub touch_connected: bool,
    pub accelerometer: Vec3,
    /// Pointer position normalized to `[0, 1]` over the surface.
    pub pointer: Vec2,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            move_x: 0.0,
            jump_held: false,
            continue_held: false,
            back_held: false,
            virtual_buttons: VirtualButtons::default(),
            touches: Vec::new(),
            touch_connected: false,
            accelerometer: Vec3::ZERO,
            pointer: Vec2::splat(0.5),
        }
    }
}

pub struct InputAggregator {
    virtual_pad: VirtualGamePad,
    surface_size: (u32, u32),
}

impl InputAggregator {
    pub fn new(surface_size: (u32, u32)) -> Self {
        Self {
            virtual_pad: VirtualGamePad::new(),
            surface_size,
        }
    }

    pub fn set_surface_size(&mut self, surface_size: (u32, u32)) {
        self.surface_size = surface_size;
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    pub fn virtual_pad(&self) -> &VirtualGamePad {
        &self.virtual_pad
    }

    pub fn virtual_pad_mut(&mut self) -> &mut VirtualGamePad {
        &mut self.virtual_pad
    }

    /// Physical pixels → logical design units.
    fn to_logical(&self, physical: Vec2) -> Vec2 {
        let surface = self.surface_extent();
        physical * LOGICAL_SIZE / surface
    }

    fn surface_extent(&self) -> Vec2 {
        Vec2::new(
            self.surface_size.0.max(1) as f32,
            self.surface_size.1.max(1) as f32,
        )
    }

    /// Sample every source once. Call exactly once per frame and hand the
    /// result to everything that needs input during that frame.
    pub fn sample(&self, raw: &InputState) -> InputSnapshot {
        let touches: Vec<Vec2> = raw.touches().map(|t| self.to_logical(t.position)).collect();
        let virtual_buttons = self.virtual_pad.buttons(&touches);
        let pad = raw.gamepad;
        let accel = raw.accelerometer;

        let mut move_x = 0.0;
        if pad.connected && pad.left_stick_x.abs() >= STICK_DEAD_ZONE {
            move_x = pad.left_stick_x.clamp(-1.0, 1.0);
        }
        if accel.active && accel.acceleration[0].abs() >= TILT_DEAD_ZONE {
            move_x = (accel.acceleration[0] * ACCELEROMETER_SCALE).clamp(-1.0, 1.0);
        }

        let left = raw.is_held(Key::Left)
            || raw.is_held(Key::A)
            || (pad.connected && pad.dpad_left)
            || virtual_buttons.left;
        let right = raw.is_held(Key::Right)
            || raw.is_held(Key::D)
            || (pad.connected && pad.dpad_right)
            || virtual_buttons.right;
        if left && !right {
            move_x = -1.0;
        } else if right && !left {
            move_x = 1.0;
        }

        let pad_a = pad.connected && pad.button_a;
        let jump_held = raw.is_held(Key::Space)
            || raw.is_held(Key::Up)
            || raw.is_held(Key::W)
            || pad_a
            || virtual_buttons.jump;
        let continue_held =
            raw.is_held(Key::Space) || pad_a || virtual_buttons.jump || !touches.is_empty();
        let back_held = raw.is_held(Key::Escape) || (pad.connected && pad.button_back);

        let pointer = Vec2::new(raw.mouse_position.0 as f32, raw.mouse_position.1 as f32)
            / self.surface_extent();

        InputSnapshot {
            move_x,
            jump_held,
            continue_held,
            back_held,
            virtual_buttons,
            touches,
            touch_connected: raw.is_touch_connected(),
            accelerometer: Vec3::from_array(accel.acceleration),
            pointer: pointer.clamp(Vec2::ZERO, Vec2::ONE),
        }
    }
}
