#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Compute backends for the ray-marching pass
//!
//! A thin abstraction over the graphics device that runs the ray-marching
//! kernel. Callers never touch device objects directly: buffers, textures and
//! compiled programs are referred to through opaque handles, and every
//! operation goes through [`ComputeBackend`].
//!
//! Two backends ship with the crate:
//!
//! -   [`MockCpu`] (feature `mock`, on by default) records every call and
//!     keeps texture contents in host memory. The SDF math is not evaluated.
//! -   [`WgpuBackend`] (feature `gpu`) runs the WGSL kernel on the system GPU.
//!
//! [`default_backend`] picks the GPU when it can and falls back to the mock.

use std::sync::Arc;
use thiserror::Error;

pub mod backend;
pub mod layout;
#[cfg(feature = "gpu")]
pub mod wgpu_backend;

pub use backend::ComputeBackend;
#[cfg(feature = "mock")]
pub use backend::mock_cpu::{MockCpu, MockEvent};
pub use layout::{BindingKind, THREAD_GROUP_SIZE};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    #[error("backend not available")]
    BackendUnavailable,
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("binding mismatch for {kernel:?}: {reason}")]
    BindingMismatch { kernel: Kernel, reason: &'static str },
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),
    #[error("texture size mismatch: expected {expected:?}, got {actual:?}")]
    TextureSizeMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
}

/// Compute kernels known to the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Marches one ray per pixel through the flattened shape array.
    RayMarch,
}

impl Kernel {
    #[must_use]
    pub const fn binding_count(&self) -> u32 {
        layout::binding_count(self)
    }

    #[must_use]
    pub const fn entry_point(&self) -> &'static str {
        match self {
            Kernel::RayMarch => "main",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Kernel::RayMarch => "raymarch",
        }
    }

    /// WGSL source embedded at build time.
    #[must_use]
    pub const fn default_source(&self) -> &'static str {
        match self {
            Kernel::RayMarch => include_str!("../../../shaders/raymarch.wgsl"),
        }
    }
}

#[derive(Clone)]
pub struct BufferView {
    pub data: Arc<[u8]>,
    pub shape: Vec<usize>, // Number of elements per dimension
    pub element_size_in_bytes: usize,
}

impl BufferView {
    #[must_use]
    pub fn new(data: Arc<[u8]>, shape: Vec<usize>, element_size_in_bytes: usize) -> Self {
        Self { data, shape, element_size_in_bytes }
    }

    /// Wraps a slice of plain-old-data elements as a one-dimensional view.
    #[must_use]
    pub fn from_pod_slice<T: bytemuck::Pod>(items: &[T]) -> Self {
        let data: Arc<[u8]> = bytemuck::cast_slice(items).to_vec().into();
        Self::new(data, vec![items.len()], std::mem::size_of::<T>())
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Checks that the byte length matches shape times element size.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::ShapeMismatch`] when the lengths disagree.
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.data.len() == self.element_count() * self.element_size_in_bytes {
            Ok(())
        } else {
            Err(ComputeError::ShapeMismatch(
                "Buffer data length does not match product of shape dimensions and element size",
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Storage,
    Uniform,
}

macro_rules! handle {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub const KIND: &'static str = $kind;

            #[must_use]
            pub const fn from_raw(id: u32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn id(self) -> u32 {
                self.0
            }

            pub(crate) fn unknown(self) -> ComputeError {
                ComputeError::UnknownHandle { kind: $kind, id: self.0 }
            }
        }
    };
}

handle!(BufferHandle, "buffer");
handle!(TextureHandle, "texture");
handle!(ProgramHandle, "program");

/// One resource bound to a kernel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    SampledTexture(TextureHandle),
    StorageTexture(TextureHandle),
    StorageBuffer(BufferHandle),
    UniformBuffer(BufferHandle),
}

impl Binding {
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        match self {
            Binding::SampledTexture(_) => BindingKind::SampledTexture,
            Binding::StorageTexture(_) => BindingKind::StorageTexture,
            Binding::StorageBuffer(_) => BindingKind::StorageBuffer,
            Binding::UniformBuffer(_) => BindingKind::UniformBuffer,
        }
    }
}

/// Host copy of an RGBA32F texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl TextureData {
    #[must_use]
    pub fn filled(width: u32, height: u32, pixel: [f32; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    /// Builds a texture by evaluating `f(x, y)` for every pixel, row-major.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Returns a compute backend if available, falling back to the CPU mock.
///
/// With the `gpu` feature enabled this will attempt to create a
/// [`WgpuBackend`]. If GPU initialization fails or the feature is not
/// enabled, a [`MockCpu`] backend is returned.
#[must_use]
pub fn default_backend() -> Arc<dyn ComputeBackend> {
    #[cfg(feature = "gpu")]
    {
        match WgpuBackend::new() {
            Ok(gpu) => {
                tracing::info!("Using wgpu backend.");
                return Arc::new(gpu);
            }
            Err(e) => tracing::warn!("wgpu backend initialization failed ({e}), falling back..."),
        }
    }

    #[cfg(feature = "mock")]
    {
        tracing::info!("Using MockCpu backend.");
        Arc::new(MockCpu::default())
    }

    #[cfg(not(feature = "mock"))]
    {
        compile_error!("No compute backend available. Enable the 'mock' feature or ensure a GPU backend can initialize.");
    }
}
