#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Scene model for CSG ray marching
//!
//! Shapes are components attached to nodes of a transform hierarchy. This
//! crate owns the shape data model and the two algorithms that read the
//! hierarchy every frame:
//!
//! -   [`scale`] resolves a shape's effective scale from its nearest shape
//!     ancestor, with a lazily refreshed per-shape cache.
//! -   [`flatten`](flatten::flatten) orders every shape into the sequence the
//!     marching kernel walks: top-level shapes sorted by [`Operation`], each
//!     followed by its shape subtree.
//!
//! Both are generic over [`HierarchyProvider`], so a host can expose its own
//! scene graph. [`SceneGraph`] is the arena-backed graph used by the
//! `marcher` binary and the tests.
//!
//! ```rust
//! use glam::Vec3;
//! use scene::{flatten, Operation, SceneGraph, ShapeNode, ShapeType, Transform};
//!
//! let mut graph = SceneGraph::new();
//! let body = graph.spawn_shape("body", Transform::IDENTITY, ShapeNode::new(ShapeType::Sphere));
//! graph
//!     .spawn_child(
//!         body,
//!         "bite",
//!         Transform::from_position(Vec3::X),
//!         Some(ShapeNode::new(ShapeType::Cube).with_operation(Operation::Subtract)),
//!     )
//!     .unwrap();
//!
//! let flat = flatten(&graph);
//! assert_eq!(flat.len(), 2);
//! assert_eq!(flat.entries()[0].child_shape_count, 1);
//! ```

pub mod flatten;
pub mod graph;
pub mod hierarchy;
pub mod scale;
pub mod shape;
pub mod transform;
pub mod types;

pub use flatten::{flatten, FlatEntry, FlattenedScene};
pub use graph::{NodeId, SceneError, SceneGraph};
pub use hierarchy::HierarchyProvider;
pub use scale::{effective_scale, set_scale, ScaleWrite};
pub use shape::{CacheState, ScaleCache, ShapeNode, DEFAULT_BLEND_STRENGTH};
pub use transform::{euler_degrees, quat_from_euler_degrees, Transform};
pub use types::{Operation, ShapeType, UnknownDiscriminant};
