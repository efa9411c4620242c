//! Local transforms and the helpers that turn them into world-space values.
//!
//! Rotations are stored as quaternions. The shape buffer wants Euler angles in
//! degrees, applied roll (Z), pitch (X), then yaw (Y), which is glam's
//! `EulerRot::YXZ` decomposition.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Position, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::IDENTITY }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the rotation from Euler angles in degrees.
    #[must_use]
    pub fn with_euler_degrees(self, degrees: Vec3) -> Self {
        self.with_rotation(quat_from_euler_degrees(degrees))
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Parent-from-local matrix: `T * R * S`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[must_use]
pub fn quat_from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Euler angles in degrees (x = pitch, y = yaw, z = roll), each in `[0, 360)`.
#[must_use]
pub fn euler_degrees(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(
        wrap_degrees(pitch.to_degrees()),
        wrap_degrees(yaw.to_degrees()),
        wrap_degrees(roll.to_degrees()),
    )
}

fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-3), "{a:?} != {b:?}");
    }

    #[test]
    fn identity_transform() {
        let m = Transform::IDENTITY.to_matrix();
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn translation_lands_in_last_column() {
        let m = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).to_matrix();
        assert_eq!(m.to_cols_array_2d()[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn euler_round_trip() {
        let angles = Vec3::new(30.0, 45.0, 10.0);
        let q = quat_from_euler_degrees(angles);
        assert_close(euler_degrees(q), angles);
    }

    #[test]
    fn negative_angles_wrap_positive() {
        let q = quat_from_euler_degrees(Vec3::new(0.0, -90.0, 0.0));
        assert_close(euler_degrees(q), Vec3::new(0.0, 270.0, 0.0));
    }

    #[test]
    fn scale_is_applied_before_rotation() {
        let t = Transform::IDENTITY
            .with_euler_degrees(Vec3::new(0.0, 0.0, 90.0))
            .with_scale(Vec3::new(2.0, 1.0, 1.0));
        let p = t.to_matrix().transform_point3(Vec3::X);
        assert_close(p, Vec3::new(0.0, 2.0, 0.0));
    }
}
