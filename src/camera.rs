//! Perspective camera for scene views.

use glam::{Mat4, Vec3};

/// Fixed-position perspective camera.
///
/// The camera does not move during animation; only its aspect ratio changes
/// when the viewport is resized.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    fov_y: f32,
    /// Viewport width / height.
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a camera at `position` looking at `target`.
    ///
    /// The aspect ratio starts at 1.0 and is corrected on the first
    /// viewport resize.
    pub fn new(position: Vec3, target: Vec3, fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target,
            fov_y,
            aspect: 1.0,
            near,
            far,
        }
    }

    /// Update the aspect ratio from a viewport size in pixels.
    ///
    /// Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[inline]
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// View matrix looking from the camera position toward the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Perspective projection for the current aspect ratio.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Combined projection * view matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 12.0),
            Vec3::ZERO,
            50.0_f32.to_radians(),
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_viewport_sets_aspect() {
        let mut camera = test_camera();
        camera.set_viewport(1024, 768);
        assert!((camera.aspect() - 1024.0 / 768.0).abs() < 1e-6);

        camera.set_viewport(1000, 400);
        assert!((camera.aspect() - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_viewport_is_ignored() {
        let mut camera = test_camera();
        camera.set_viewport(800, 600);
        let before = camera.aspect();
        camera.set_viewport(0, 600);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect(), before);
    }

    #[test]
    fn test_resize_changes_projection_only() {
        let mut camera = test_camera();
        camera.set_viewport(1024, 768);
        let view_before = camera.view_matrix();
        let proj_before = camera.projection_matrix();

        camera.set_viewport(1000, 400);
        assert_eq!(camera.view_matrix(), view_before);
        assert_ne!(camera.projection_matrix(), proj_before);
    }

    #[test]
    fn test_view_projection_composes() {
        let mut camera = test_camera();
        camera.set_viewport(640, 480);
        let expected = camera.projection_matrix() * camera.view_matrix();
        assert_eq!(camera.view_projection(), expected);
    }
}
