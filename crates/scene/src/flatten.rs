//! Turns a shape hierarchy into the ordered sequence the marching kernel
//! consumes.
//!
//! Top-level shapes are stable-sorted by [`Operation`](crate::Operation).
//! Each one is followed by its subtree in depth-first pre-order, children in
//! sibling order. A shape is top-level when its direct parent carries no
//! shape, which includes shapes hidden behind a plain intermediary node.

use crate::hierarchy::HierarchyProvider;

/// One emitted shape and the number of direct shape children that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatEntry<N> {
    pub node: N,
    pub child_shape_count: u32,
}

/// Flattened scene for a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedScene<N> {
    entries: Vec<FlatEntry<N>>,
}

impl<N> Default for FlattenedScene<N> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<N: Copy> FlattenedScene<N> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[FlatEntry<N>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatEntry<N>> {
        self.entries.iter()
    }

    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.entries.iter().map(|e| e.node)
    }
}

impl<'a, N> IntoIterator for &'a FlattenedScene<N> {
    type Item = &'a FlatEntry<N>;
    type IntoIter = std::slice::Iter<'a, FlatEntry<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Flattens every shape in `scene`. Each shape appears exactly once.
///
/// The hierarchy must be acyclic.
pub fn flatten<H: HierarchyProvider>(scene: &H) -> FlattenedScene<H::Node> {
    let mut top_level: Vec<_> = scene
        .shape_nodes()
        .into_iter()
        .filter(|&node| {
            scene
                .parent(node)
                .map_or(true, |parent| scene.shape(parent).is_none())
        })
        .collect();
    top_level.sort_by_key(|&node| scene.shape(node).map(|s| s.operation));

    let mut entries = Vec::new();
    let mut pending = Vec::new();
    for root in top_level {
        pending.push(root);
        while let Some(node) = pending.pop() {
            let children = scene.children(node);
            let first_shape_child = pending.len();
            pending.extend(
                children
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&child| scene.shape(child).is_some()),
            );
            let count = pending.len() - first_shape_child;
            entries.push(FlatEntry {
                node,
                child_shape_count: u32::try_from(count).unwrap_or(u32::MAX),
            });
        }
    }

    tracing::trace!(shapes = entries.len(), "flattened scene");
    FlattenedScene { entries }
}
