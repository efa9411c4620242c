#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Marching pass orchestration
//!
//! Glue between the scene model and the compute backend. Once per frame the
//! [`FrameOrchestrator`] flattens the scene, packs it into [`ShapeRecord`]s,
//! fills the [`MarchParams`] uniforms from the camera and light, and runs
//! the kernel over the frame in 8x8 tiles.
//!
//! ```rust
//! use std::sync::Arc;
//! use compute::{ComputeBackend, MockCpu};
//! use render::{Camera, FrameInputs, FrameOrchestrator, FrameOutcome};
//! use scene::{SceneGraph, ShapeNode, ShapeType, Transform};
//!
//! let backend = Arc::new(MockCpu::new());
//! let mut frames = FrameOrchestrator::with_default_kernel(backend.clone()).unwrap();
//!
//! let mut graph = SceneGraph::new();
//! graph.spawn_shape("ball", Transform::IDENTITY, ShapeNode::new(ShapeType::Sphere));
//!
//! let camera = Camera::new(64, 48);
//! let source = backend.create_texture("source", 64, 48).unwrap();
//! let output = backend.create_texture("output", 64, 48).unwrap();
//! let inputs = FrameInputs { camera: Some(&camera), light: None };
//!
//! let outcome = frames.render_frame(&graph, inputs, source, output);
//! assert_eq!(outcome, FrameOutcome::Rendered { shapes: 1, workgroups: [8, 6, 1] });
//! ```

pub mod camera;
pub mod capture;
pub mod gpu_types;
pub mod light;
pub mod orchestrator;
pub mod shape_buffer;
pub mod target;

pub use camera::Camera;
pub use capture::{save_png, CaptureError};
pub use gpu_types::{MarchParams, ShapeRecord};
pub use light::{pack_light, Light, LightKind, PackedLight};
pub use orchestrator::{FrameInputs, FrameOrchestrator, FrameOutcome, FrameStats, PassThroughReason};
pub use shape_buffer::{ShapeBuffer, BLEND_STRENGTH_SCALE};
pub use target::RenderTargetSlot;
