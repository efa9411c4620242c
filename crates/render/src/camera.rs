//! Pinhole camera feeding the marching kernel
//!
//! The kernel rebuilds each pixel ray from two matrices: camera-to-world and
//! the inverse projection. The camera also owns the pixel dimensions of the
//! frame it renders.

use glam::{Mat4, Quat, Vec3};

/// Perspective camera oriented by yaw (about +Y) then pitch (about +X).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position
    pub eye: Vec3,
    /// Horizontal rotation in radians
    pub yaw: f32,
    /// Vertical rotation in radians
    pub pitch: f32,
    /// Field of view in radians
    pub fovy: f32,
    /// Near clipping plane distance
    pub znear: f32,
    /// Far clipping plane distance
    pub zfar: f32,
    width: u32,
    height: u32,
}

impl Camera {
    /// Camera at the origin looking down -Z.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fovy: 60.0f32.to_radians(),
            znear: 0.1,
            zfar: 100.0,
            width,
            height,
        }
    }

    /// Places the camera at `eye`, facing `target`.
    #[must_use]
    pub fn looking_at(mut self, eye: Vec3, target: Vec3) -> Self {
        let forward = (target - eye).normalize_or_zero();
        self.eye = eye;
        if forward != Vec3::ZERO {
            self.yaw = (-forward.x).atan2(-forward.z);
            self.pitch = forward.y.clamp(-1.0, 1.0).asin();
        }
        self
    }

    #[must_use]
    pub const fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// True when either pixel dimension is zero.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Quat {
        Quat::from_axis_angle(Vec3::Y, self.yaw) * Quat::from_axis_angle(Vec3::X, self.pitch)
    }

    /// Get the camera's forward direction vector
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    #[must_use]
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.eye)
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.camera_to_world().inverse()
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect(), self.znear, self.zfar)
    }

    #[must_use]
    pub fn inverse_projection(&self) -> Mat4 {
        self.projection().inverse()
    }

    /// Orbits the eye around `target` on a horizontal circle.
    pub fn orbit(&mut self, target: Vec3, radius: f32, height: f32, angle: f32) {
        let eye = target + Vec3::new(angle.sin() * radius, height, angle.cos() * radius);
        *self = self.clone().looking_at(eye, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = Camera::new(640, 480);
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(cam.right().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn looking_at_points_forward_at_target() {
        let cam = Camera::new(8, 8).looking_at(Vec3::new(3.0, 2.0, 5.0), Vec3::ZERO);
        let expected = (Vec3::ZERO - Vec3::new(3.0, 2.0, 5.0)).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn camera_to_world_moves_origin_to_eye() {
        let cam = Camera::new(8, 8).looking_at(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO);
        let origin = cam.camera_to_world().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(cam.eye, 1e-5));
        assert!((cam.view() * cam.camera_to_world()).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn inverse_projection_center_ray_points_forward() {
        let cam = Camera::new(16, 9);
        let v = cam.inverse_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let dir = v.truncate().normalize();
        assert!(dir.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn degenerate_sizes() {
        assert!(Camera::new(0, 10).is_degenerate());
        assert!(!Camera::new(1, 1).is_degenerate());
        assert!((Camera::new(0, 0).aspect() - 1.0).abs() < f32::EPSILON);
    }
}
