//! GPU implementation of [`ComputeBackend`] built on [`wgpu`].
//!
//! Programs are compiled from WGSL at runtime inside a validation error scope,
//! so a broken shader surfaces as [`ComputeError::ShaderCompilation`] instead
//! of a device panic. Textures are RGBA32F and double as storage images and
//! copy endpoints. Initialization fails if no compatible adapter is found.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use wgpu::util::DeviceExt;

use crate::layout::{binding_layout, validate_bindings};
use crate::{
    Binding, BindingKind, BufferHandle, BufferUsage, BufferView, ComputeBackend, ComputeError,
    Kernel, ProgramHandle, TextureData, TextureHandle,
};

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const BYTES_PER_PIXEL: u32 = 16;

struct Program {
    kernel: Kernel,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Texture {
    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    fn copy_view(&self) -> wgpu::ImageCopyTexture<'_> {
        wgpu::ImageCopyTexture {
            texture: &self.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        }
    }
}

/// GPU-backed implementation of [`ComputeBackend`] built on `wgpu`.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_id: AtomicU32,
    programs: Mutex<HashMap<ProgramHandle, Program>>,
    buffers: Mutex<HashMap<BufferHandle, wgpu::Buffer>>,
    textures: Mutex<HashMap<TextureHandle, Texture>>,
}

impl WgpuBackend {
    /// Creates a new backend using the system's default high-performance GPU.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BackendUnavailable`] when no adapter or device
    /// can be acquired.
    pub fn new() -> Result<Self, ComputeError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(ComputeError::BackendUnavailable)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("marcher device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| {
            tracing::warn!("device request failed: {e}");
            ComputeError::BackendUnavailable
        })?;

        tracing::debug!(adapter = ?adapter.get_info().name, "wgpu device ready");
        Ok(Self {
            device,
            queue,
            next_id: AtomicU32::new(1),
            programs: Mutex::new(HashMap::new()),
            buffers: Mutex::new(HashMap::new()),
            textures: Mutex::new(HashMap::new()),
        })
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn bind_group_layout(&self, kernel: Kernel) -> wgpu::BindGroupLayout {
        let entries: Vec<_> = (0u32..)
            .zip(binding_layout(&kernel))
            .map(|(binding, kind)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: match kind {
                    BindingKind::SampledTexture => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    BindingKind::StorageTexture => wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: TEXTURE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    BindingKind::StorageBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    BindingKind::UniformBuffer => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                },
                count: None,
            })
            .collect();
        self.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(kernel.label()),
                entries: &entries,
            })
    }
}

impl ComputeBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn compile_kernel(&self, kernel: Kernel, source: &str) -> Result<ProgramHandle, ComputeError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        let layout = self.bind_group_layout(kernel);
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(kernel.label()),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
        let pipeline = self
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kernel.label()),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: kernel.entry_point(),
            });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::ShaderCompilation(error.to_string()));
        }

        let program = ProgramHandle::from_raw(self.next_id());
        self.programs.lock().insert(
            program,
            Program {
                kernel,
                pipeline,
                layout,
            },
        );
        Ok(program)
    }

    fn release_program(&self, program: ProgramHandle) {
        self.programs.lock().remove(&program);
    }

    fn create_buffer(
        &self,
        label: &str,
        view: &BufferView,
        usage: BufferUsage,
    ) -> Result<BufferHandle, ComputeError> {
        view.validate()?;
        // Zero-sized bindings are invalid; pad to a single zeroed element.
        let padding = vec![0u8; view.element_size_in_bytes.max(4)];
        let contents: &[u8] = if view.data.is_empty() { &padding } else { &view.data };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: match usage {
                    BufferUsage::Storage => {
                        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST
                    }
                    BufferUsage::Uniform => {
                        wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST
                    }
                },
            });
        let handle = BufferHandle::from_raw(self.next_id());
        self.buffers.lock().insert(handle, buffer);
        Ok(handle)
    }

    fn release_buffer(&self, buffer: BufferHandle) {
        self.buffers.lock().remove(&buffer);
    }

    fn create_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, ComputeError> {
        if width == 0 || height == 0 {
            return Err(ComputeError::TextureSizeMismatch {
                expected: (1, 1),
                actual: (width, height),
            });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = TextureHandle::from_raw(self.next_id());
        self.textures.lock().insert(
            handle,
            Texture {
                texture,
                view,
                width,
                height,
            },
        );
        Ok(handle)
    }

    fn write_texture(&self, texture: TextureHandle, data: &TextureData) -> Result<(), ComputeError> {
        let textures = self.textures.lock();
        let target = textures.get(&texture).ok_or_else(|| texture.unknown())?;
        if (target.width, target.height) != data.size() {
            return Err(ComputeError::TextureSizeMismatch {
                expected: (target.width, target.height),
                actual: data.size(),
            });
        }
        self.queue.write_texture(
            target.copy_view(),
            bytemuck::cast_slice(&data.pixels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(target.width * BYTES_PER_PIXEL),
                rows_per_image: Some(target.height),
            },
            target.extent(),
        );
        Ok(())
    }

    fn read_texture(&self, texture: TextureHandle) -> Result<TextureData, ComputeError> {
        let textures = self.textures.lock();
        let source = textures.get(&texture).ok_or_else(|| texture.unknown())?;
        let unpadded = source.width * BYTES_PER_PIXEL;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texture readback"),
            size: u64::from(padded) * u64::from(source.height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            source.copy_view(),
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(source.height),
                },
            },
            source.extent(),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| ComputeError::DispatchFailed(e.to_string()))?
            .map_err(|e| ComputeError::DispatchFailed(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(source.width as usize * source.height as usize);
        for row in mapped.chunks(padded as usize) {
            pixels.extend(
                row[..unpadded as usize]
                    .chunks_exact(BYTES_PER_PIXEL as usize)
                    .map(bytemuck::pod_read_unaligned::<[f32; 4]>),
            );
        }
        drop(mapped);
        staging.unmap();

        Ok(TextureData {
            width: source.width,
            height: source.height,
            pixels,
        })
    }

    fn release_texture(&self, texture: TextureHandle) {
        self.textures.lock().remove(&texture);
    }

    fn dispatch(
        &self,
        program: ProgramHandle,
        binds: &[Binding],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError> {
        let programs = self.programs.lock();
        let program = programs.get(&program).ok_or_else(|| program.unknown())?;
        validate_bindings(&program.kernel, binds)?;

        let buffers = self.buffers.lock();
        let textures = self.textures.lock();
        let mut entries = Vec::with_capacity(binds.len());
        for (binding, bind) in (0u32..).zip(binds) {
            let resource = match bind {
                Binding::SampledTexture(t) | Binding::StorageTexture(t) => {
                    let texture = textures.get(t).ok_or_else(|| t.unknown())?;
                    wgpu::BindingResource::TextureView(&texture.view)
                }
                Binding::StorageBuffer(b) | Binding::UniformBuffer(b) => buffers
                    .get(b)
                    .ok_or_else(|| b.unknown())?
                    .as_entire_binding(),
            };
            entries.push(wgpu::BindGroupEntry { binding, resource });
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(program.kernel.label()),
            layout: &program.layout,
            entries: &entries,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(program.kernel.label()),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(program.kernel.label()),
                timestamp_writes: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups[0], workgroups[1], workgroups[2]);
        }
        self.queue.submit(Some(encoder.finish()));
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::DispatchFailed(error.to_string()));
        }
        Ok(())
    }

    fn blit(&self, source: TextureHandle, destination: TextureHandle) -> Result<(), ComputeError> {
        let textures = self.textures.lock();
        let src = textures.get(&source).ok_or_else(|| source.unknown())?;
        let dst = textures
            .get(&destination)
            .ok_or_else(|| destination.unknown())?;
        if (src.width, src.height) != (dst.width, dst.height) {
            return Err(ComputeError::TextureSizeMismatch {
                expected: (dst.width, dst.height),
                actual: (src.width, src.height),
            });
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("blit") });
        encoder.copy_texture_to_texture(src.copy_view(), dst.copy_view(), src.extent());
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
