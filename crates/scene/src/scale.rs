//! Effective scale of shapes inheriting from their nearest shape ancestor.
//!
//! Plain nodes between two shapes do not contribute: a shape inherits only
//! the effective scale of its shape parent. The ancestor contribution is
//! cached per shape and recomputed lazily while the cache is dirty.
//!
//! The cache is never invalidated by a read. A shape that loses its shape
//! parent keeps the stale contribution until the next [`set_scale`] call
//! notices the loss.

use glam::Vec3;

use crate::hierarchy::HierarchyProvider;

/// Result of a [`set_scale`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleWrite {
    Applied,
    /// The shape still has a shape parent; its scale is inherited.
    Ignored,
}

/// Local scale multiplied component-wise by the shape ancestor's effective
/// scale. Nodes without a shape report their local scale.
pub fn effective_scale<H: HierarchyProvider>(scene: &H, node: H::Node) -> Vec3 {
    let local = scene.local_transform(node).scale;
    let Some(shape) = scene.shape(node) else {
        return local;
    };
    let cache = shape.scale_cache();
    if cache.is_dirty() {
        let parent = scene.shape_parent(node);
        let contribution = parent.map_or(Vec3::ONE, |p| effective_scale(scene, p));
        cache.refresh(contribution, parent.is_some());
        tracing::trace!(?node, ?contribution, "refreshed scale cache");
    }
    local * cache.parent_scale()
}

/// Writes the scale of a shape that has no shape parent.
///
/// While the shape has one the write is dropped, whatever the cache last
/// saw. Otherwise the write sets both the local scale and the cached
/// contribution to `scale` and marks the cache dirty.
pub fn set_scale<H: HierarchyProvider>(scene: &mut H, node: H::Node, scale: Vec3) -> ScaleWrite {
    if let Some(shape) = scene.shape(node) {
        if scene.shape_parent(node).is_some() {
            return ScaleWrite::Ignored;
        }
        let cache = shape.scale_cache();
        if cache.has_parent() {
            cache.mark_orphaned();
        }
        cache.overwrite(scale);
    }
    scene.set_local_scale(node, scale);
    ScaleWrite::Applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneGraph;
    use crate::shape::{CacheState, ShapeNode};
    use crate::transform::Transform;
    use crate::types::ShapeType;

    fn scaled(s: f32) -> Transform {
        Transform::IDENTITY.with_scale(Vec3::splat(s))
    }

    #[test]
    fn read_cleans_the_cache() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn_shape("s", scaled(2.0), ShapeNode::new(ShapeType::Sphere));
        assert_eq!(graph.shape(node).unwrap().scale_cache().state(), CacheState::Dirty);
        assert_eq!(effective_scale(&graph, node), Vec3::splat(2.0));
        let cache = graph.shape(node).unwrap().scale_cache();
        assert_eq!(cache.state(), CacheState::Clean);
        assert!(cache.has_parent());
    }

    #[test]
    fn write_under_live_parent_is_ignored() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn_shape("p", scaled(2.0), ShapeNode::default());
        let child = graph
            .spawn_child(parent, "c", scaled(3.0), Some(ShapeNode::default()))
            .unwrap();
        assert_eq!(set_scale(&mut graph, child, Vec3::splat(9.0)), ScaleWrite::Ignored);
        assert_eq!(graph.local_transform(child).scale, Vec3::splat(3.0));
        assert_eq!(effective_scale(&graph, child), Vec3::splat(6.0));
    }

    #[test]
    fn plain_nodes_keep_their_scale() {
        let mut graph = SceneGraph::new();
        let plain = graph.spawn("plain", scaled(4.0));
        assert_eq!(set_scale(&mut graph, plain, Vec3::splat(5.0)), ScaleWrite::Applied);
        assert_eq!(effective_scale(&graph, plain), Vec3::splat(5.0));
    }
}
