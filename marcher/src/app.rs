//! # Marcher Application Logic
//!
//! Builds the demo scene and drives the frame loop.
//!
//! The demo is a small CSG composition: a core sphere with a blended
//! satellite and a subtracted notch, a pedestal, and a spinning torus clipped
//! by an intersected sphere. Every frame animates the scene, orbits the
//! camera and hands both to the [`FrameOrchestrator`]. When a shader path is
//! given with `--watch`, the kernel is recompiled between frames whenever the
//! file changes; a broken edit leaves frames passing through until it is
//! fixed.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use compute::{ComputeBackend, MockCpu, TextureData, TextureHandle};
use glam::Vec3;
use render::{save_png, Camera, FrameInputs, FrameOrchestrator, FrameOutcome, Light};
use scene::{
    quat_from_euler_degrees, set_scale, NodeId, Operation, SceneGraph, ScaleWrite, ShapeNode,
    ShapeType, Transform,
};

use crate::watcher;
use crate::{Cli, LightArg};

const CAMERA_RADIUS: f32 = 7.0;
const CAMERA_HEIGHT: f32 = 2.5;
const TICKS_PER_SECOND: f32 = 60.0;
const WATCH_FRAME_DURATION: Duration = Duration::from_millis(33);

/// The demo composition and handles to its animated nodes.
pub struct DemoScene {
    pub graph: SceneGraph,
    core: NodeId,
    satellite: NodeId,
    spinner: NodeId,
}

impl DemoScene {
    /// Builds the composition.
    ///
    /// # Errors
    ///
    /// Propagates scene graph errors, which only occur if a parent handle is
    /// stale.
    pub fn build() -> Result<Self> {
        let mut graph = SceneGraph::new();

        let composition = graph.spawn("composition", Transform::IDENTITY);
        graph.spawn_child(
            composition,
            "pedestal",
            Transform::from_position(Vec3::new(0.0, -1.6, 0.0))
                .with_scale(Vec3::new(3.0, 0.2, 3.0)),
            Some(ShapeNode::new(ShapeType::Cube).with_colour(Vec3::new(0.55, 0.55, 0.6))),
        )?;

        let core = graph.spawn_child(
            composition,
            "core",
            Transform::IDENTITY.with_scale(Vec3::splat(1.2)),
            Some(ShapeNode::new(ShapeType::Sphere).with_colour(Vec3::new(0.9, 0.35, 0.2))),
        )?;
        let satellite = graph.spawn_child(
            core,
            "satellite",
            Transform::from_position(Vec3::new(1.1, 0.0, 0.0)).with_scale(Vec3::splat(0.5)),
            Some(
                ShapeNode::new(ShapeType::Sphere)
                    .with_operation(Operation::Blend)
                    .with_blend_strength(0.6)
                    .with_colour(Vec3::new(0.95, 0.8, 0.25)),
            ),
        )?;
        graph.spawn_child(
            core,
            "notch",
            Transform::from_position(Vec3::new(0.0, 0.7, 0.6))
                .with_euler_degrees(Vec3::new(30.0, 45.0, 0.0))
                .with_scale(Vec3::splat(0.45)),
            Some(ShapeNode::new(ShapeType::Cube).with_operation(Operation::Subtract)),
        )?;

        let spinner = graph.spawn_child(
            composition,
            "spinner",
            Transform::from_position(Vec3::new(-2.4, 0.2, -0.5)),
            None,
        )?;
        let ring = graph.spawn_child(
            spinner,
            "ring",
            Transform::IDENTITY.with_euler_degrees(Vec3::new(90.0, 0.0, 0.0)),
            Some(ShapeNode::new(ShapeType::Torus).with_colour(Vec3::new(0.2, 0.6, 0.9))),
        )?;
        graph.spawn_child(
            ring,
            "ring clip",
            Transform::from_position(Vec3::new(0.0, 0.0, 0.4)).with_scale(Vec3::splat(0.9)),
            Some(ShapeNode::new(ShapeType::Sphere).with_operation(Operation::Intersect)),
        )?;

        tracing::info!(nodes = graph.len(), "demo scene built");
        Ok(Self { graph, core, satellite, spinner })
    }

    /// Poses the animated nodes for time `t` in seconds.
    pub fn animate(&mut self, t: f32) {
        if let Some(transform) = self.graph.transform_mut(self.satellite) {
            transform.position = Vec3::new(t.cos() * 1.1, (t * 1.7).sin() * 0.4, t.sin() * 1.1);
        }
        if let Some(transform) = self.graph.transform_mut(self.spinner) {
            transform.rotation = quat_from_euler_degrees(Vec3::new(0.0, t.to_degrees() * 0.8, 0.0));
        }
        let pulse = Vec3::splat(1.2 + (t * 2.0).sin() * 0.08);
        if set_scale(&mut self.graph, self.core, pulse) == ScaleWrite::Ignored {
            tracing::warn!("core scale write ignored");
        }
    }
}

/// Run the render loop described by `cli`.
///
/// # Errors
///
/// Returns an error if the backend cannot allocate the frame textures, the
/// initial kernel fails to compile, the shader watcher cannot start or the
/// final frame cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let backend: Arc<dyn ComputeBackend> = if cli.no_gpu {
        tracing::info!("Using MockCpu backend.");
        Arc::new(MockCpu::new())
    } else {
        compute::default_backend()
    };

    let mut orchestrator = FrameOrchestrator::new(Arc::clone(&backend));
    match &cli.shader {
        Some(path) => load_shader(&mut orchestrator, path)?,
        None => orchestrator
            .load_program(compute::Kernel::RayMarch.default_source())
            .context("embedded kernel failed to compile")?,
    }

    let shader_watcher = match (&cli.shader, cli.watch) {
        (Some(path), true) => Some(watcher::start(path)?),
        _ => None,
    };

    let mut demo = DemoScene::build()?;
    let mut camera = Camera::new(cli.width, cli.height);
    let light = match cli.light {
        LightArg::Directional => Some(Light::directional()),
        LightArg::Point => Some(Light::point(Vec3::new(4.0, 6.0, 3.0))),
        LightArg::None => None,
    };

    let source = backend
        .create_texture("source", cli.width, cli.height)
        .context("failed to allocate source frame")?;
    let output = backend
        .create_texture("output", cli.width, cli.height)
        .context("failed to allocate output frame")?;
    backend.write_texture(source, &background(cli.width, cli.height))?;

    tracing::info!(frames = cli.frames, width = cli.width, height = cli.height, "Starting render loop");
    for frame in 0..cli.frames {
        let frame_start = Instant::now();

        if let (Some(w), Some(path)) = (&shader_watcher, &cli.shader) {
            if w.take_change() {
                if let Err(e) = load_shader(&mut orchestrator, path) {
                    tracing::error!("Shader reload failed, passing frames through: {e:#}");
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let t = frame as f32 / TICKS_PER_SECOND;
        demo.animate(t);
        camera.orbit(Vec3::ZERO, CAMERA_RADIUS, CAMERA_HEIGHT, t * 0.5);

        let inputs = FrameInputs { camera: Some(&camera), light: light.as_ref() };
        match orchestrator.render_frame(&demo.graph, inputs, source, output) {
            FrameOutcome::Failed(e) => tracing::warn!(frame, "frame failed: {e}"),
            FrameOutcome::PassThrough(reason) if frame == 0 => {
                tracing::warn!(?reason, "first frame passed through");
            }
            _ => {}
        }

        if (frame + 1) % 30 == 0 {
            tracing::info!("Frame {} complete.", frame + 1);
        }

        if shader_watcher.is_some() {
            let elapsed = frame_start.elapsed();
            if elapsed < WATCH_FRAME_DURATION {
                std::thread::sleep(WATCH_FRAME_DURATION - elapsed);
            }
        }
    }

    let stats = orchestrator.stats();
    tracing::info!(
        rendered = stats.frames_rendered,
        passed_through = stats.frames_passed_through,
        failed = stats.frames_failed,
        target_allocations = stats.target_allocations,
        "Render loop finished"
    );

    if let Some(path) = &cli.output {
        save_png(backend.as_ref(), output, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    release_frames(backend.as_ref(), [source, output]);
    Ok(())
}

fn load_shader(orchestrator: &mut FrameOrchestrator, path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    orchestrator
        .load_program(&source)
        .with_context(|| format!("failed to compile {}", path.display()))
}

fn release_frames(backend: &dyn ComputeBackend, textures: [TextureHandle; 2]) {
    for texture in textures {
        backend.release_texture(texture);
    }
}

/// Vertical sky gradient used as the source frame.
fn background(width: u32, height: u32) -> TextureData {
    #[allow(clippy::cast_precision_loss)]
    let span = height.max(2) as f32 - 1.0;
    TextureData::from_fn(width, height, |_, y| {
        #[allow(clippy::cast_precision_loss)]
        let v = y as f32 / span;
        [0.55 - 0.35 * v, 0.7 - 0.4 * v, 0.95 - 0.45 * v, 1.0]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{flatten, HierarchyProvider};

    #[test]
    fn demo_scene_flattens_every_shape_once() {
        let demo = DemoScene::build().unwrap();
        let flattened = flatten(&demo.graph);
        assert_eq!(flattened.len(), 6);
        let mut nodes = flattened.nodes().collect::<Vec<_>>();
        nodes.sort();
        nodes.dedup();
        assert_eq!(nodes.len(), 6);
    }

    #[test]
    fn animation_moves_the_satellite_and_keeps_core_scale() {
        let mut demo = DemoScene::build().unwrap();
        let before = demo.graph.world_position(demo.satellite);
        demo.animate(1.0);
        assert_ne!(demo.graph.world_position(demo.satellite), before);
        let expected = Vec3::splat(1.2 + 2.0f32.sin() * 0.08);
        assert!(scene::effective_scale(&demo.graph, demo.core).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn demo_renders_on_the_mock_backend() {
        let backend = Arc::new(MockCpu::new());
        let mut orchestrator = FrameOrchestrator::with_default_kernel(backend.clone()).unwrap();
        let demo = DemoScene::build().unwrap();
        let camera = Camera::new(16, 16).looking_at(Vec3::new(0.0, 2.0, 7.0), Vec3::ZERO);
        let source = backend.create_texture("source", 16, 16).unwrap();
        let output = backend.create_texture("output", 16, 16).unwrap();
        backend.write_texture(source, &background(16, 16)).unwrap();

        let outcome = orchestrator.render_frame(
            &demo.graph,
            FrameInputs { camera: Some(&camera), light: None },
            source,
            output,
        );
        assert_eq!(outcome, FrameOutcome::Rendered { shapes: 6, workgroups: [2, 2, 1] });
    }
}
