use glam::{Mat4, Vec2, Vec4};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera over the logical target.
pub struct Camera2D {
    pub position: Vec2,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            viewport: (viewport_width, viewport_height),
        }
    }

    fn half_extent(&self) -> Vec2 {
        Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5
    }

    /// World layer: y-up, centred on `position`.
    pub fn world_matrix(&self) -> Mat4 {
        let half = self.half_extent();
        Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        )
    }

    /// Overlay layer: y-down pixels with the origin at the top-left.
    pub fn screen_matrix(&self) -> Mat4 {
        let size = self.half_extent() * 2.0;
        Mat4::orthographic_rh(0.0, size.x, size.y, 0.0, -1.0, 1.0)
    }

    pub fn world_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.world_matrix().to_cols_array_2d(),
        }
    }

    pub fn screen_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.screen_matrix().to_cols_array_2d(),
        }
    }
}

/// Clip-space position of `point` under `matrix`.
pub fn project(matrix: Mat4, point: Vec2) -> Vec2 {
    let clip = matrix * Vec4::new(point.x, point.y, 0.0, 1.0);
    Vec2::new(clip.x, clip.y) / clip.w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn world_camera_centre_maps_to_clip_origin() {
        let mut camera = Camera2D::new(800, 480);
        camera.position = Vec2::new(1000.0, 240.0);
        let m = camera.world_matrix();
        assert!(close(project(m, camera.position), Vec2::ZERO));
        assert!(close(project(m, Vec2::new(1400.0, 480.0)), Vec2::new(1.0, 1.0)));
    }

    #[test]
    fn screen_camera_puts_origin_top_left() {
        let camera = Camera2D::new(800, 480);
        let m = camera.screen_matrix();
        assert!(close(project(m, Vec2::ZERO), Vec2::new(-1.0, 1.0)));
        assert!(close(project(m, Vec2::new(800.0, 480.0)), Vec2::new(1.0, -1.0)));
    }
}
