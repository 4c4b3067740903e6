//! Backend-neutral drawing contract used by the frame loop.
//!
//! The frame loop decides *what* is drawn and in which order; a backend
//! (wgpu in the game binary, a recorder in tests) decides *how*.
//!
//! Coordinate systems:
//!  - **World** layer: y-up world units, viewed through a camera centred on
//!    the position passed to `draw_world`.
//!  - **Overlay** layer: y-down logical pixels, `(0, 0)` at the top-left of
//!    the 800×480 design target.

use glam::Vec2;

pub const LOGICAL_WIDTH: u32 = 800;
pub const LOGICAL_HEIGHT: u32 = 480;
pub const LOGICAL_SIZE: Vec2 = Vec2::new(LOGICAL_WIDTH as f32, LOGICAL_HEIGHT as f32);

pub const CLEAR_COLOR: [f32; 4] = [0.392, 0.584, 0.929, 1.0];

/// An axis-aligned coloured rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub center: Vec2,
    pub size: Vec2,
    pub color: [f32; 4],
}

impl Quad {
    pub fn new(center: Vec2, size: Vec2, color: [f32; 4]) -> Self {
        Self {
            center,
            size,
            color,
        }
    }

    /// Quad from its top-left corner, for overlay layouts.
    pub fn from_top_left(top_left: Vec2, size: Vec2, color: [f32; 4]) -> Self {
        Self::new(top_left + size * 0.5, size, color)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        (point.x - self.center.x).abs() <= half.x && (point.y - self.center.y).abs() <= half.y
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.color[3] *= alpha.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorldBounds {
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Camera centre that follows `focus` without showing anything outside
/// `bounds`. Axes where the level is smaller than the view are centred.
pub fn clamp_camera(focus: Vec2, bounds: WorldBounds, view: Vec2) -> Vec2 {
    let half = view * 0.5;
    let axis = |focus: f32, min: f32, max: f32, half: f32| {
        if max - min <= half * 2.0 {
            (min + max) * 0.5
        } else {
            focus.clamp(min + half, max - half)
        }
    };
    Vec2::new(
        axis(focus.x, bounds.min.x, bounds.max.x, half.x),
        axis(focus.y, bounds.min.y, bounds.max.y, half.y),
    )
}

/// Parameters of the radial magnifier pass applied when the logical target
/// is scaled onto the physical surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnifierParams {
    /// Pointer position normalized to `[0, 1]` over the surface.
    pub pointer: Vec2,
    /// Physical surface size in pixels.
    pub surface_size: Vec2,
    /// Squared lens radius in physical pixels.
    pub radius_sqr: f32,
    /// 0 = no magnification, 1 = everything collapses to the centre.
    pub factor: f32,
}

impl MagnifierParams {
    pub fn new(pointer: Vec2, surface_size: (u32, u32), factor: f32) -> Self {
        let size = Vec2::new(surface_size.0 as f32, surface_size.1 as f32);
        let radius = size.x.min(size.y) / 8.0;
        Self {
            pointer: pointer.clamp(Vec2::ZERO, Vec2::ONE),
            surface_size: size,
            radius_sqr: radius * radius,
            factor: factor.clamp(0.0, 1.0),
        }
    }
}

/// Full-screen status panel shown over a finished level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOverlay {
    Win,
    Lose,
    Died,
}

impl StatusOverlay {
    pub fn color(self) -> [f32; 4] {
        match self {
            Self::Win => [0.20, 0.65, 0.25, 0.85],
            Self::Lose => [0.75, 0.45, 0.10, 0.85],
            Self::Died => [0.70, 0.12, 0.12, 0.85],
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Win => "YOU WIN",
            Self::Lose => "YOU LOSE",
            Self::Died => "YOU DIED",
        }
    }

    /// Centred panel with a dark frame, in overlay coordinates.
    pub fn quads(self) -> [Quad; 2] {
        let center = LOGICAL_SIZE * 0.5;
        let panel = Vec2::new(360.0, 120.0);
        [
            Quad::new(center, panel + Vec2::splat(8.0), [0.05, 0.05, 0.08, 0.9]),
            Quad::new(center, panel, self.color()),
        ]
    }
}

pub trait FrameRenderer {
    /// Start a frame into the off-screen target of `logical_size` pixels.
    fn begin_target(&mut self, logical_size: (u32, u32), clear: [f32; 4]);

    fn draw_world(&mut self, camera_center: Vec2, quads: &[Quad]);

    fn draw_overlay(&mut self, quads: &[Quad]);

    /// Scale the finished target onto the surface through the magnifier.
    fn present_magnified(&mut self, params: &MagnifierParams);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(w: f32, h: f32) -> WorldBounds {
        WorldBounds {
            min: Vec2::ZERO,
            max: Vec2::new(w, h),
        }
    }

    #[test]
    fn camera_clamps_to_level_edges() {
        let view = LOGICAL_SIZE;
        let level = bounds(2000.0, 480.0);
        assert_eq!(clamp_camera(Vec2::new(0.0, 0.0), level, view), Vec2::new(400.0, 240.0));
        assert_eq!(
            clamp_camera(Vec2::new(1000.0, 100.0), level, view),
            Vec2::new(1000.0, 240.0)
        );
        assert_eq!(
            clamp_camera(Vec2::new(1990.0, 240.0), level, view),
            Vec2::new(1600.0, 240.0)
        );
    }

    #[test]
    fn small_level_is_centred() {
        let cam = clamp_camera(Vec2::new(5.0, 5.0), bounds(400.0, 200.0), LOGICAL_SIZE);
        assert_eq!(cam, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn magnifier_radius_is_an_eighth_of_the_short_side() {
        let params = MagnifierParams::new(Vec2::new(0.5, 0.5), (1600, 960), 0.2);
        assert!((params.radius_sqr - 120.0 * 120.0).abs() < 1e-3);
        assert_eq!(params.surface_size, Vec2::new(1600.0, 960.0));
    }

    #[test]
    fn magnifier_pointer_is_clamped_to_surface() {
        let params = MagnifierParams::new(Vec2::new(-1.0, 3.0), (800, 480), 0.2);
        assert_eq!(params.pointer, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn quad_contains_uses_half_extents() {
        let quad = Quad::from_top_left(Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0), [1.0; 4]);
        assert!(quad.contains(Vec2::new(10.0, 10.0)));
        assert!(quad.contains(Vec2::new(30.0, 20.0)));
        assert!(!quad.contains(Vec2::new(31.0, 15.0)));
    }
}
