use glam::Vec2;

use crate::collision::{Aabb, CollisionMoveResult, TileGrid};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerInput {
    pub move_x: f32,
    /// Rising edge of the jump control.
    pub jump_pressed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    pub max_speed: f32,
    pub accel_ground: f32,
    pub accel_air: f32,
    pub friction_ground: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub jump_speed: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_speed: 260.0,
            accel_ground: 2200.0,
            accel_air: 1300.0,
            friction_ground: 2600.0,
            gravity: -2200.0,
            max_fall_speed: -900.0,
            jump_speed: 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

/// Player body: velocity integration plus move-and-slide against the tiles.
#[derive(Debug, Clone, Copy)]
pub struct CharacterController {
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub grounded: bool,
    pub contacts: ContactState,
    pub config: ControllerConfig,
}

impl CharacterController {
    pub fn new(aabb: Aabb) -> Self {
        Self {
            aabb,
            velocity: Vec2::ZERO,
            grounded: false,
            contacts: ContactState::default(),
            config: ControllerConfig::default(),
        }
    }

    /// Put the body back at `aabb` at rest.
    pub fn reset(&mut self, aabb: Aabb, grid: &TileGrid) {
        self.aabb = aabb;
        self.velocity = Vec2::ZERO;
        self.contacts = ContactState::default();
        self.grounded = grid.is_supported(aabb);
    }

    pub fn step(&mut self, input: ControllerInput, dt: f32, grid: &TileGrid) {
        // Horizontal control: accelerate toward intent, friction when grounded and idle.
        let accel = if self.grounded {
            self.config.accel_ground
        } else {
            self.config.accel_air
        };

        if input.move_x != 0.0 {
            let target = input.move_x.clamp(-1.0, 1.0) * self.config.max_speed;
            self.velocity.x = move_towards(self.velocity.x, target, accel * dt);
        } else if self.grounded {
            self.velocity.x = move_towards(self.velocity.x, 0.0, self.config.friction_ground * dt);
        }

        // Jump is edge-triggered and only legal from grounded state.
        if input.jump_pressed && self.grounded {
            self.velocity.y = self.config.jump_speed;
            self.grounded = false;
        }

        self.velocity.y = (self.velocity.y + self.config.gravity * dt).max(self.config.max_fall_speed);

        let delta = self.velocity * dt;
        let result = grid.move_and_collide_detailed(self.aabb, delta.x, delta.y);
        self.apply_collision_result(result);
    }

    fn apply_collision_result(&mut self, result: CollisionMoveResult) {
        self.aabb = result.aabb;
        self.contacts = ContactState {
            left: result.blocked_left,
            right: result.blocked_right,
            down: result.blocked_down,
            up: result.blocked_up,
        };

        if (result.blocked_left && self.velocity.x < 0.0)
            || (result.blocked_right && self.velocity.x > 0.0)
        {
            self.velocity.x = 0.0;
        }

        if result.blocked_up && self.velocity.y > 0.0 {
            self.velocity.y = 0.0;
        }
        // Grounded is driven from collision contact, not from y-position heuristics.
        if result.blocked_down && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
            self.grounded = true;
        } else if result.collided_y {
            self.velocity.y = 0.0;
            self.grounded = false;
        } else {
            self.grounded = false;
        }
    }

    /// Velocity as observed from outside; a body resting on the ground
    /// reports zero vertical speed.
    pub fn observed_velocity(&self) -> Vec2 {
        if self.grounded {
            Vec2::new(self.velocity.x, 0.0)
        } else {
            self.velocity
        }
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}
