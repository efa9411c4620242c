//! Per-frame driver for the marching pass.
//!
//! Each call to [`FrameOrchestrator::render_frame`] flattens the scene,
//! uploads the shape array and the frame parameters, dispatches the kernel
//! into a cached render target and copies that target over the output. When
//! something the pass depends on is missing, the source frame is passed
//! through unchanged instead.

use std::sync::Arc;

use compute::layout::workgroups_for;
use compute::{
    Binding, BufferHandle, BufferUsage, BufferView, ComputeBackend, ComputeError, Kernel,
    ProgramHandle, TextureHandle,
};
use scene::{flatten, HierarchyProvider};

use crate::camera::Camera;
use crate::gpu_types::MarchParams;
use crate::light::{pack_light, Light};
use crate::shape_buffer::ShapeBuffer;
use crate::target::RenderTargetSlot;

/// What the host provides for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInputs<'a> {
    pub camera: Option<&'a Camera>,
    pub light: Option<&'a Light>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    NoProgram,
    NoCamera,
    ZeroSizedCamera,
    EmptyScene,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Rendered { shapes: u32, workgroups: [u32; 3] },
    PassThrough(PassThroughReason),
    Failed(ComputeError),
}

impl FrameOutcome {
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_rendered: u64,
    pub frames_passed_through: u64,
    pub frames_failed: u64,
    pub target_allocations: u64,
}

pub struct FrameOrchestrator {
    backend: Arc<dyn ComputeBackend>,
    program: Option<ProgramHandle>,
    target: RenderTargetSlot,
    stats: FrameStats,
}

impl FrameOrchestrator {
    /// Creates an orchestrator with no program bound. Frames pass through
    /// until [`load_program`](Self::load_program) succeeds.
    #[must_use]
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Self {
        Self {
            backend,
            program: None,
            target: RenderTargetSlot::Uninitialized,
            stats: FrameStats::default(),
        }
    }

    /// Creates an orchestrator and compiles the embedded kernel.
    ///
    /// # Errors
    ///
    /// Returns the compilation error if the embedded kernel is rejected.
    pub fn with_default_kernel(backend: Arc<dyn ComputeBackend>) -> Result<Self, ComputeError> {
        let mut orchestrator = Self::new(backend);
        orchestrator.load_program(Kernel::RayMarch.default_source())?;
        Ok(orchestrator)
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    #[must_use]
    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    /// Compiles `source` and binds it, replacing the current program.
    ///
    /// A failed compile leaves no program bound.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::ShaderCompilation`] from the backend.
    pub fn load_program(&mut self, source: &str) -> Result<(), ComputeError> {
        self.unbind_program();
        let program = self.backend.compile_kernel(Kernel::RayMarch, source)?;
        tracing::info!(backend = self.backend.name(), "raymarch kernel bound");
        self.program = Some(program);
        Ok(())
    }

    pub fn unbind_program(&mut self) {
        if let Some(program) = self.program.take() {
            self.backend.release_program(program);
        }
    }

    #[must_use]
    pub const fn stats(&self) -> FrameStats {
        self.stats
    }

    #[must_use]
    pub const fn target(&self) -> &RenderTargetSlot {
        &self.target
    }

    /// Renders one frame of `scene` from `source` into `output`.
    ///
    /// `source` and `output` must have the camera's pixel size. Transient
    /// buffers are released before this returns, whatever the outcome.
    pub fn render_frame<H: HierarchyProvider>(
        &mut self,
        scene: &H,
        inputs: FrameInputs<'_>,
        source: TextureHandle,
        output: TextureHandle,
    ) -> FrameOutcome {
        let outcome = match self.prepare(scene, inputs) {
            Err(reason) => self.pass_through(reason, source, output),
            Ok((program, camera, shapes)) => {
                self.dispatch(program, camera, inputs.light, &shapes, source, output)
            }
        };
        match &outcome {
            FrameOutcome::Rendered { shapes, workgroups } => {
                self.stats.frames_rendered += 1;
                tracing::debug!(shapes, ?workgroups, "frame rendered");
            }
            FrameOutcome::PassThrough(reason) => {
                self.stats.frames_passed_through += 1;
                tracing::debug!(?reason, "frame passed through");
            }
            FrameOutcome::Failed(error) => {
                self.stats.frames_failed += 1;
                tracing::error!(%error, "frame failed");
            }
        }
        outcome
    }

    fn prepare<'a, H: HierarchyProvider>(
        &self,
        scene: &H,
        inputs: FrameInputs<'a>,
    ) -> Result<(ProgramHandle, &'a Camera, ShapeBuffer), PassThroughReason> {
        let program = self.program.ok_or(PassThroughReason::NoProgram)?;
        let camera = inputs.camera.ok_or(PassThroughReason::NoCamera)?;
        if camera.is_degenerate() {
            return Err(PassThroughReason::ZeroSizedCamera);
        }
        let flattened = flatten(scene);
        if flattened.is_empty() {
            return Err(PassThroughReason::EmptyScene);
        }
        Ok((program, camera, ShapeBuffer::build(scene, &flattened)))
    }

    fn pass_through(
        &self,
        reason: PassThroughReason,
        source: TextureHandle,
        output: TextureHandle,
    ) -> FrameOutcome {
        if source != output {
            if let Err(error) = self.backend.blit(source, output) {
                return FrameOutcome::Failed(error);
            }
        }
        FrameOutcome::PassThrough(reason)
    }

    fn dispatch(
        &mut self,
        program: ProgramHandle,
        camera: &Camera,
        light: Option<&Light>,
        shapes: &ShapeBuffer,
        source: TextureHandle,
        output: TextureHandle,
    ) -> FrameOutcome {
        let (width, height) = camera.pixel_size();
        let destination = match self.target.ensure(self.backend.as_ref(), width, height) {
            Ok((texture, fresh)) => {
                if fresh {
                    self.stats.target_allocations += 1;
                }
                texture
            }
            Err(error) => return FrameOutcome::Failed(error),
        };

        let packed = pack_light(light, camera);
        let params = MarchParams {
            camera_to_world: camera.camera_to_world().to_cols_array_2d(),
            camera_inverse_projection: camera.inverse_projection().to_cols_array_2d(),
            light: packed.vector.to_array(),
            position_light: u32::from(packed.is_position),
            shape_count: shapes.record_count(),
            _pad: [0; 3],
        };

        let mut transient: Vec<BufferHandle> = Vec::with_capacity(2);
        let workgroups = workgroups_for(width, height);
        let result = self
            .upload(shapes, &params, &mut transient)
            .and_then(|[shape_buffer, params_buffer]| {
                let binds = [
                    Binding::SampledTexture(source),
                    Binding::StorageTexture(destination),
                    Binding::StorageBuffer(shape_buffer),
                    Binding::UniformBuffer(params_buffer),
                ];
                self.backend.dispatch(program, &binds, workgroups)
            });
        for buffer in transient {
            self.backend.release_buffer(buffer);
        }

        match result.and_then(|()| self.backend.blit(destination, output)) {
            Ok(()) => FrameOutcome::Rendered {
                shapes: shapes.record_count(),
                workgroups,
            },
            Err(error) => FrameOutcome::Failed(error),
        }
    }

    fn upload(
        &self,
        shapes: &ShapeBuffer,
        params: &MarchParams,
        transient: &mut Vec<BufferHandle>,
    ) -> Result<[BufferHandle; 2], ComputeError> {
        let shape_buffer = shapes.upload(self.backend.as_ref())?;
        transient.push(shape_buffer);
        let params_buffer = self.backend.create_buffer(
            "march params",
            &BufferView::from_pod_slice(std::slice::from_ref(params)),
            BufferUsage::Uniform,
        )?;
        transient.push(params_buffer);
        Ok([shape_buffer, params_buffer])
    }
}

impl Drop for FrameOrchestrator {
    fn drop(&mut self) {
        self.target.release(self.backend.as_ref());
        self.unbind_program();
    }
}
