//! Raw device state accumulated from platform events between frames.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every frame the key
//!   is physically down. Movement and the continue signal read this.
//!
//! - **Edge-triggered (just_pressed):** true only during the frame the press
//!   happened, cleared by `end_frame()`. The frame loop
//!   calls `end_frame()` only after a simulation step consumed the frame, so a
//!   press landing on a zero-step frame is not lost.
//!
//! Touches are tracked by platform finger id and live until the finger lifts.
//! Gamepad and accelerometer readings are plain value types overwritten by the
//! platform layer whenever it has something newer.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Escape,
    Space,
    F3,
    W,
    A,
    D,
}

/// A finger currently on the screen, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Vec2,
}

/// Last reported state of a physical gamepad.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadState {
    pub connected: bool,
    pub left_stick_x: f32,
    pub dpad_left: bool,
    pub dpad_right: bool,
    pub button_a: bool,
    pub button_back: bool,
}

/// Last reported accelerometer reading in g units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccelerometerState {
    pub active: bool,
    pub acceleration: [f32; 3],
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,

    touches: BTreeMap<u64, Vec2>,
    touch_capable: bool,

    pub mouse_position: (f64, f64),
    pub gamepad: GamepadState,
    pub accelerometer: AccelerometerState,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            touches: BTreeMap::new(),
            touch_capable: false,
            mouse_position: (0.0, 0.0),
            gamepad: GamepadState::default(),
            accelerometer: AccelerometerState::default(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Finger placed or moved.
    pub fn touch_moved(&mut self, id: u64, position: Vec2) {
        self.touch_capable = true;
        self.touches.insert(id, position);
    }

    /// Finger lifted or the platform cancelled the touch.
    pub fn touch_ended(&mut self, id: u64) {
        self.touches.remove(&id);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    /// Active touches ordered by finger id.
    pub fn touches(&self) -> impl Iterator<Item = TouchPoint> + '_ {
        self.touches
            .iter()
            .map(|(&id, &position)| TouchPoint { id, position })
    }

    /// True once the platform has delivered any touch event.
    pub fn is_touch_connected(&self) -> bool {
        self.touch_capable
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
