#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Marcher: CSG ray marching over a scene hierarchy
//!
//! ## Overview
//!
//! Marcher renders scenes built from signed-distance primitives combined with
//! constructive solid geometry. Shapes live in a hierarchy: each one is
//! combined with the running result (union, smooth blend, subtraction or
//! intersection) and its shape children are folded into it first. Every frame
//! the hierarchy is flattened into a GPU array and a compute kernel marches
//! one ray per pixel through it.
//!
//! ## Project Architecture
//!
//! -   **`marcher`:** The crate you are currently viewing. It is the
//!     documentation entry point and the headless driver binary: command line
//!     handling, the animated demo scene, the frame loop and shader
//!     hot-reloading.
//! -   **[`compute`]:** The backend seam. A [`compute::ComputeBackend`] trait
//!     with a recording CPU mock for tests and a `wgpu` implementation behind
//!     the `gpu` feature.
//! -   **[`scene`]:** The scene model. Shape types, operations, the
//!     [`scene::HierarchyProvider`] trait with an arena-backed
//!     [`scene::SceneGraph`], scale inheritance and flattening.
//! -   **[`render`]:** The per-frame pass. GPU record layouts, camera and light
//!     packing, the cached render target and the
//!     [`render::FrameOrchestrator`].
//!
//! ## Getting Started
//!
//! ```text
//! cargo run -p marcher -- --frames 60 --output frame.png
//! cargo run -p marcher --features gpu -- --shader shaders/raymarch.wgsl --watch
//! ```

pub use compute;
pub use render;
pub use scene;
