use crate::{
    Binding, BufferHandle, BufferUsage, BufferView, ComputeError, Kernel, ProgramHandle,
    TextureData, TextureHandle,
};

#[cfg(feature = "mock")]
pub mod mock_cpu;

/// Device operations the ray-marching pass needs.
///
/// Every resource is created and released through the backend and referred
/// to by handle. Releasing a handle only gives up the caller's claim: work
/// already submitted that uses the resource still completes.
pub trait ComputeBackend: Send + Sync + 'static {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    /// Compiles `source` as the program for `kernel`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::ShaderCompilation`] when the source is rejected.
    fn compile_kernel(&self, kernel: Kernel, source: &str) -> Result<ProgramHandle, ComputeError>;

    fn release_program(&self, program: ProgramHandle);

    /// Creates a device buffer initialised with the contents of `view`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::ShapeMismatch`] if `view` is inconsistent.
    fn create_buffer(
        &self,
        label: &str,
        view: &BufferView,
        usage: BufferUsage,
    ) -> Result<BufferHandle, ComputeError>;

    fn release_buffer(&self, buffer: BufferHandle);

    /// Creates an RGBA32F texture usable as a kernel input, a kernel output
    /// and a copy source/destination.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::TextureSizeMismatch`] for a zero-sized request.
    fn create_texture(&self, label: &str, width: u32, height: u32)
        -> Result<TextureHandle, ComputeError>;

    /// Uploads host pixels into `texture`.
    ///
    /// # Errors
    ///
    /// Fails on an unknown handle or when the sizes differ.
    fn write_texture(&self, texture: TextureHandle, data: &TextureData) -> Result<(), ComputeError>;

    /// Reads `texture` back to host memory, waiting for queued work.
    ///
    /// # Errors
    ///
    /// Fails on an unknown handle.
    fn read_texture(&self, texture: TextureHandle) -> Result<TextureData, ComputeError>;

    fn release_texture(&self, texture: TextureHandle);

    /// Submits `program` over a `workgroups` grid. Does not wait for completion.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BindingMismatch`] if `binds` do not match the
    /// kernel layout, or [`ComputeError::UnknownHandle`] for stale handles.
    fn dispatch(
        &self,
        program: ProgramHandle,
        binds: &[Binding],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError>;

    /// Copies `source` into `destination`. Both must have the same size.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::TextureSizeMismatch`] when sizes differ.
    fn blit(&self, source: TextureHandle, destination: TextureHandle) -> Result<(), ComputeError>;
}
