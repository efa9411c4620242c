use thiserror::Error;

/// Primitive evaluated by the marching kernel.
///
/// `Cone` and `Pyramid` are carried through the scene and the shape buffer
/// but the kernel does not evaluate them yet.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShapeType {
    #[default]
    Sphere = 0,
    Cube = 1,
    Cone = 2,
    Pyramid = 3,
    Capsule = 4,
    Torus = 5,
}

/// How a shape combines with whatever it is folded into.
///
/// The discriminant order is significant: top-level shapes are evaluated in
/// ascending operation order, so unions are in place before anything is cut
/// out of or intersected with them.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Operation {
    #[default]
    Union = 0,
    /// Smooth union, radius controlled by the blend strength.
    Blend = 1,
    Subtract = 2,
    Intersect = 3,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} has no variant {value}")]
pub struct UnknownDiscriminant {
    pub kind: &'static str,
    pub value: i32,
}

impl ShapeType {
    pub const ALL: [ShapeType; 6] = [
        ShapeType::Sphere,
        ShapeType::Cube,
        ShapeType::Cone,
        ShapeType::Pyramid,
        ShapeType::Capsule,
        ShapeType::Torus,
    ];

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether the marching kernel produces a surface for this type.
    #[must_use]
    pub const fn is_evaluated(self) -> bool {
        !matches!(self, ShapeType::Cone | ShapeType::Pyramid)
    }
}

impl TryFrom<i32> for ShapeType {
    type Error = UnknownDiscriminant;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_i32() == value)
            .ok_or(UnknownDiscriminant { kind: "ShapeType", value })
    }
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Union,
        Operation::Blend,
        Operation::Subtract,
        Operation::Intersect,
    ];

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Operation {
    type Error = UnknownDiscriminant;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_i32() == value)
            .ok_or(UnknownDiscriminant { kind: "Operation", value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminants_match_kernel_constants() {
        assert_eq!(ShapeType::Sphere.as_i32(), 0);
        assert_eq!(ShapeType::Torus.as_i32(), 5);
        assert_eq!(Operation::Blend.as_i32(), 1);
        assert_eq!(Operation::Intersect.as_i32(), 3);
    }

    #[test]
    fn operations_order_by_discriminant() {
        let mut ops = vec![Operation::Intersect, Operation::Union, Operation::Subtract];
        ops.sort();
        assert_eq!(ops, vec![Operation::Union, Operation::Subtract, Operation::Intersect]);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert_eq!(ShapeType::try_from(4), Ok(ShapeType::Capsule));
        assert!(ShapeType::try_from(6).is_err());
        assert!(Operation::try_from(-1).is_err());
    }

    #[test]
    fn reserved_types_are_not_evaluated() {
        assert!(!ShapeType::Cone.is_evaluated());
        assert!(!ShapeType::Pyramid.is_evaluated());
        assert!(ShapeType::Capsule.is_evaluated());
    }
}
