use glam::{Mat4, Quat, Vec3};

use crate::shape::ShapeNode;
use crate::transform::{euler_degrees, Transform};

/// Read access to a host scene graph, plus the single write the scale cache
/// needs.
///
/// Implementors own the tree. Everything in this crate works through this
/// trait, so a host can plug in its own graph without copying it into a
/// [`SceneGraph`](crate::SceneGraph). Node handles passed in must be live;
/// implementations may answer with defaults for stale ones.
pub trait HierarchyProvider {
    type Node: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    /// Every node carrying a [`ShapeNode`], in discovery order.
    fn shape_nodes(&self) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Direct children in sibling order.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    fn local_transform(&self, node: Self::Node) -> Transform;

    fn shape(&self, node: Self::Node) -> Option<&ShapeNode>;

    fn set_local_scale(&mut self, node: Self::Node, scale: Vec3);

    /// Nearest ancestor carrying a shape, skipping plain nodes.
    fn shape_parent(&self, node: Self::Node) -> Option<Self::Node> {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if self.shape(candidate).is_some() {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Direct children carrying a shape. Plain intermediaries are not looked
    /// through.
    fn shape_child_count(&self, node: Self::Node) -> usize {
        self.children(node)
            .iter()
            .filter(|&&child| self.shape(child).is_some())
            .count()
    }

    /// World-from-local matrix composed up the parent chain.
    fn world_matrix(&self, node: Self::Node) -> Mat4 {
        let mut matrix = self.local_transform(node).to_matrix();
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            matrix = self.local_transform(ancestor).to_matrix() * matrix;
            current = self.parent(ancestor);
        }
        matrix
    }

    fn world_position(&self, node: Self::Node) -> Vec3 {
        self.world_matrix(node).w_axis.truncate()
    }

    /// Rotation composed up the parent chain, ignoring scale.
    fn world_rotation(&self, node: Self::Node) -> Quat {
        let mut rotation = self.local_transform(node).rotation;
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            rotation = self.local_transform(ancestor).rotation * rotation;
            current = self.parent(ancestor);
        }
        rotation.normalize()
    }

    /// World rotation as Euler degrees in `[0, 360)`.
    fn world_euler_degrees(&self, node: Self::Node) -> Vec3 {
        euler_degrees(self.world_rotation(node))
    }
}
