//! On-screen touch controls: left/right arrows and a jump button.
//!
//! The arrows double as an onboarding hint: they stay hidden while the player
//! is moving and fade in after a few idle seconds, so a first-time touch user
//! discovers them without them cluttering active play.

use glam::Vec2;

use crate::render::{Quad, LOGICAL_SIZE};

/// Idle time before the hint starts fading in.
const HINT_DELAY_SECS: f32 = 4.0;
/// Time for the hint to go from transparent to fully visible.
const HINT_FADE_SECS: f32 = 2.0;

const BUTTON_SIZE: f32 = 64.0;
const MARGIN: f32 = 12.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualButtons {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl VirtualButtons {
    pub fn any(&self) -> bool {
        self.left || self.right || self.jump
    }
}

pub struct VirtualGamePad {
    left: Quad,
    right: Quad,
    jump: Quad,
    seconds_since_movement: f32,
}

impl VirtualGamePad {
    pub fn new() -> Self {
        let bottom = LOGICAL_SIZE.y - MARGIN - BUTTON_SIZE;
        let size = Vec2::splat(BUTTON_SIZE);
        let color = [1.0, 1.0, 1.0, 0.6];
        Self {
            left: Quad::from_top_left(Vec2::new(MARGIN, bottom), size, color),
            right: Quad::from_top_left(Vec2::new(MARGIN * 2.0 + BUTTON_SIZE, bottom), size, color),
            jump: Quad::from_top_left(
                Vec2::new(LOGICAL_SIZE.x - MARGIN - BUTTON_SIZE, bottom),
                size,
                [0.4, 1.0, 0.4, 0.6],
            ),
            seconds_since_movement: 0.0,
        }
    }

    /// Buttons covered by any of `touches` (logical coordinates).
    pub fn buttons(&self, touches: &[Vec2]) -> VirtualButtons {
        let mut buttons = VirtualButtons::default();
        for &touch in touches {
            buttons.left |= self.left.contains(touch);
            buttons.right |= self.right.contains(touch);
            buttons.jump |= self.jump.contains(touch);
        }
        buttons
    }

    pub fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.seconds_since_movement += dt;
        }
    }

    pub fn notify_player_is_moving(&mut self) {
        self.seconds_since_movement = 0.0;
    }

    /// Opacity of the onboarding hint, 0 while the player is active.
    pub fn hint_opacity(&self) -> f32 {
        ((self.seconds_since_movement - HINT_DELAY_SECS) / HINT_FADE_SECS).clamp(0.0, 1.0)
    }

    /// Overlay quads, already faded by the hint opacity.
    pub fn quads(&self) -> [Quad; 3] {
        let alpha = self.hint_opacity();
        [
            self.left.with_alpha(alpha),
            self.right.with_alpha(alpha),
            self.jump.with_alpha(alpha),
        ]
    }
}

impl Default for VirtualGamePad {
    fn default() -> Self {
        Self::new()
    }
}
