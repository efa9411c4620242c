use glam::Vec3;

use crate::camera::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// World position; ignored for directional lights.
    pub position: Vec3,
}

impl Light {
    #[must_use]
    pub const fn directional() -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
        }
    }

    #[must_use]
    pub const fn point(position: Vec3) -> Self {
        Self {
            kind: LightKind::Point,
            position,
        }
    }
}

/// Light vector as the kernel receives it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedLight {
    pub vector: Vec3,
    pub is_position: bool,
}

/// Directional lights, and a missing light, shine along the camera's
/// forward axis. Every other light is sent as a world position.
#[must_use]
pub fn pack_light(light: Option<&Light>, camera: &Camera) -> PackedLight {
    match light {
        Some(light) if light.kind != LightKind::Directional => PackedLight {
            vector: light.position,
            is_position: true,
        },
        _ => PackedLight {
            vector: camera.forward(),
            is_position: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_light_follows_camera() {
        let camera = Camera::new(4, 4).looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let packed = pack_light(Some(&Light::directional()), &camera);
        assert!(!packed.is_position);
        assert!(packed.vector.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn point_and_spot_lights_send_position() {
        let camera = Camera::new(4, 4);
        let pos = Vec3::new(1.0, 4.0, -2.0);
        let packed = pack_light(Some(&Light::point(pos)), &camera);
        assert_eq!(packed, PackedLight { vector: pos, is_position: true });

        let spot = Light { kind: LightKind::Spot, position: pos };
        assert!(pack_light(Some(&spot), &camera).is_position);
    }

    #[test]
    fn missing_light_is_treated_as_directional() {
        let camera = Camera::new(4, 4);
        assert_eq!(
            pack_light(None, &camera),
            pack_light(Some(&Light::directional()), &camera)
        );
    }
}
