use std::cell::Cell;

use glam::Vec3;

use crate::types::{Operation, ShapeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Clean,
    Dirty,
}

/// Cached scale contribution of a shape's nearest shape ancestor.
///
/// Reads refresh a dirty cache, so the cells are written through `&self`.
/// The frame loop is single-threaded; `Cell` keeps the type `!Sync`.
#[derive(Debug, Clone)]
pub struct ScaleCache {
    state: Cell<CacheState>,
    parent_scale: Cell<Vec3>,
    has_parent: Cell<bool>,
}

impl Default for ScaleCache {
    fn default() -> Self {
        Self {
            state: Cell::new(CacheState::Dirty),
            parent_scale: Cell::new(Vec3::ONE),
            has_parent: Cell::new(true),
        }
    }
}

impl ScaleCache {
    #[must_use]
    pub fn state(&self) -> CacheState {
        self.state.get()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.get() == CacheState::Dirty
    }

    #[must_use]
    pub fn parent_scale(&self) -> Vec3 {
        self.parent_scale.get()
    }

    /// Cleared only by a write that finds the shape parent gone. Reads can
    /// raise it again but never clear it.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.has_parent.get()
    }

    pub(crate) fn refresh(&self, parent_scale: Vec3, found_parent: bool) {
        self.parent_scale.set(parent_scale);
        if found_parent {
            self.has_parent.set(true);
        }
        self.state.set(CacheState::Clean);
    }

    pub(crate) fn mark_orphaned(&self) {
        self.has_parent.set(false);
    }

    pub(crate) fn overwrite(&self, scale: Vec3) {
        self.parent_scale.set(scale);
        self.state.set(CacheState::Dirty);
    }
}

/// Blend strength of a freshly created shape.
pub const DEFAULT_BLEND_STRENGTH: f32 = 0.5;

/// A primitive taking part in the CSG composition.
///
/// Position, rotation and scale come from the owning node's transform; this
/// component holds what the marching kernel needs on top of that.
#[derive(Debug, Clone)]
pub struct ShapeNode {
    pub shape_type: ShapeType,
    pub operation: Operation,
    /// Linear RGB, each channel in `[0, 1]`.
    pub colour: Vec3,
    blend_strength: f32,
    scale_cache: ScaleCache,
}

impl Default for ShapeNode {
    fn default() -> Self {
        Self::new(ShapeType::default())
    }
}

impl ShapeNode {
    #[must_use]
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            operation: Operation::Union,
            colour: Vec3::ONE,
            blend_strength: DEFAULT_BLEND_STRENGTH,
            scale_cache: ScaleCache::default(),
        }
    }

    #[must_use]
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    #[must_use]
    pub fn with_colour(mut self, colour: Vec3) -> Self {
        self.colour = colour;
        self
    }

    #[must_use]
    pub fn with_blend_strength(mut self, strength: f32) -> Self {
        self.set_blend_strength(strength);
        self
    }

    #[must_use]
    pub fn blend_strength(&self) -> f32 {
        self.blend_strength
    }

    /// Stores `strength` clamped to `[0, 1]`. NaN is stored as 0.
    pub fn set_blend_strength(&mut self, strength: f32) {
        self.blend_strength = if strength.is_nan() {
            0.0
        } else {
            strength.clamp(0.0, 1.0)
        };
    }

    #[must_use]
    pub fn scale_cache(&self) -> &ScaleCache {
        &self.scale_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let shape = ShapeNode::default();
        assert_eq!(shape.shape_type, ShapeType::Sphere);
        assert_eq!(shape.operation, Operation::Union);
        assert_eq!(shape.colour, Vec3::ONE);
        assert_eq!(shape.blend_strength(), DEFAULT_BLEND_STRENGTH);
        assert!(shape.scale_cache().is_dirty());
        assert!(shape.scale_cache().has_parent());
    }

    #[test]
    fn blend_strength_is_clamped() {
        let mut shape = ShapeNode::new(ShapeType::Cube);
        shape.set_blend_strength(1.7);
        assert_eq!(shape.blend_strength(), 1.0);
        shape.set_blend_strength(-0.2);
        assert_eq!(shape.blend_strength(), 0.0);
        shape.set_blend_strength(f32::NAN);
        assert_eq!(shape.blend_strength(), 0.0);
        assert_eq!(ShapeNode::default().with_blend_strength(0.4).blend_strength(), 0.4);
    }

    #[test]
    fn cache_transitions() {
        let cache = ScaleCache::default();
        cache.refresh(Vec3::splat(2.0), true);
        assert_eq!(cache.state(), CacheState::Clean);
        cache.mark_orphaned();
        cache.overwrite(Vec3::splat(3.0));
        assert_eq!(cache.state(), CacheState::Dirty);
        assert!(!cache.has_parent());
        assert_eq!(cache.parent_scale(), Vec3::splat(3.0));
    }

    #[test]
    fn refresh_without_parent_keeps_parent_flag() {
        let cache = ScaleCache::default();
        cache.refresh(Vec3::ONE, false);
        assert_eq!(cache.state(), CacheState::Clean);
        assert!(cache.has_parent());

        cache.mark_orphaned();
        cache.refresh(Vec3::ONE, false);
        assert!(!cache.has_parent());
        cache.refresh(Vec3::splat(2.0), true);
        assert!(cache.has_parent());
    }
}
