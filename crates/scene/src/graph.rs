//! Arena-backed scene graph.
//!
//! Nodes live in a slot vector indexed by [`NodeId`]. Slots are never reused,
//! so a despawned id stays invalid for the lifetime of the graph and
//! discovery order is creation order.

use glam::Vec3;
use thiserror::Error;

use crate::hierarchy::HierarchyProvider;
use crate::shape::ShapeNode;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} cannot be its own parent")]
    SelfParent(NodeId),
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    Cycle { child: NodeId, parent: NodeId },
}

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shape: Option<ShapeNode>,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    slots: Vec<Option<Entity>>,
    live: usize,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root node without a shape.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        self.insert(name.into(), transform, None)
    }

    /// Adds a root node carrying `shape`.
    pub fn spawn_shape(
        &mut self,
        name: impl Into<String>,
        transform: Transform,
        shape: ShapeNode,
    ) -> NodeId {
        self.insert(name.into(), transform, Some(shape))
    }

    /// Spawns a node and attaches it under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `parent` is not live.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        shape: Option<ShapeNode>,
    ) -> Result<NodeId, SceneError> {
        self.entity(parent)?;
        let child = self.insert(name.into(), transform, shape);
        self.set_parent(child, Some(parent))?;
        Ok(child)
    }

    fn insert(&mut self, name: String, transform: Transform, shape: Option<ShapeNode>) -> NodeId {
        let id = NodeId(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        self.slots.push(Some(Entity {
            name,
            transform,
            parent: None,
            children: Vec::new(),
            shape,
        }));
        self.live += 1;
        id
    }

    fn entity(&self, node: NodeId) -> Result<&Entity, SceneError> {
        self.slots
            .get(node.index())
            .and_then(Option::as_ref)
            .ok_or(SceneError::UnknownNode(node))
    }

    fn entity_mut(&mut self, node: NodeId) -> Result<&mut Entity, SceneError> {
        self.slots
            .get_mut(node.index())
            .and_then(Option::as_mut)
            .ok_or(SceneError::UnknownNode(node))
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.entity(node).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(|&n| self.entity(n).is_ok_and(|e| e.parent.is_none()))
    }

    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.entity(node).ok().map(|e| e.name.as_str())
    }

    #[must_use]
    pub fn transform(&self, node: NodeId) -> Option<&Transform> {
        self.entity(node).ok().map(|e| &e.transform)
    }

    pub fn transform_mut(&mut self, node: NodeId) -> Option<&mut Transform> {
        self.entity_mut(node).ok().map(|e| &mut e.transform)
    }

    pub fn shape_mut(&mut self, node: NodeId) -> Option<&mut ShapeNode> {
        self.entity_mut(node).ok().and_then(|e| e.shape.as_mut())
    }

    /// Attaches a shape to `node`, returning the one it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `node` is not live.
    pub fn add_shape(
        &mut self,
        node: NodeId,
        shape: ShapeNode,
    ) -> Result<Option<ShapeNode>, SceneError> {
        Ok(self.entity_mut(node)?.shape.replace(shape))
    }

    /// Strips the shape from `node`; the node itself stays in the tree.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `node` is not live.
    pub fn remove_shape(&mut self, node: NodeId) -> Result<Option<ShapeNode>, SceneError> {
        Ok(self.entity_mut(node)?.shape.take())
    }

    /// Moves `child` under `parent`, or to the root when `parent` is `None`.
    /// The child is appended after its new siblings.
    ///
    /// # Errors
    ///
    /// Fails on unknown nodes, self-parenting, or when `parent` lies inside
    /// the subtree of `child`.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        self.entity(child)?;
        if let Some(parent) = parent {
            if parent == child {
                return Err(SceneError::SelfParent(child));
            }
            let mut ancestor = Some(parent);
            while let Some(a) = ancestor {
                if a == child {
                    return Err(SceneError::Cycle { child, parent });
                }
                ancestor = self.entity(a)?.parent;
            }
        }

        if let Some(old) = self.entity(child)?.parent {
            self.entity_mut(old)?.children.retain(|&c| c != child);
        }
        if let Some(parent) = parent {
            self.entity_mut(parent)?.children.push(child);
        }
        self.entity_mut(child)?.parent = parent;
        Ok(())
    }

    /// Removes `node` and every descendant. Returns how many nodes went.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `node` is not live.
    pub fn despawn(&mut self, node: NodeId) -> Result<usize, SceneError> {
        self.set_parent(node, None)?;
        let mut pending = vec![node];
        let mut removed = 0;
        while let Some(next) = pending.pop() {
            if let Some(entity) = self.slots.get_mut(next.index()).and_then(Option::take) {
                pending.extend(entity.children);
                removed += 1;
            }
        }
        self.live -= removed;
        tracing::debug!(?node, removed, "despawned subtree");
        Ok(removed)
    }
}

impl HierarchyProvider for SceneGraph {
    type Node = NodeId;

    fn shape_nodes(&self) -> Vec<NodeId> {
        self.nodes()
            .filter(|&n| self.entity(n).is_ok_and(|e| e.shape.is_some()))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.entity(node).ok().and_then(|e| e.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.entity(node)
            .map_or(&[] as &[NodeId], |e| e.children.as_slice())
    }

    fn local_transform(&self, node: NodeId) -> Transform {
        self.entity(node).map_or(Transform::IDENTITY, |e| e.transform)
    }

    fn shape(&self, node: NodeId) -> Option<&ShapeNode> {
        self.entity(node).ok().and_then(|e| e.shape.as_ref())
    }

    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) {
        if let Ok(entity) = self.entity_mut(node) {
            entity.transform.scale = scale;
        }
    }
}
