//! Recording backend that keeps every resource in host memory.
//!
//! `MockCpu` validates inputs the same way the GPU backend does and logs each
//! call as a [`MockEvent`], which lets frame logic be tested without a device.
//! The ray-marching math is not evaluated: a dispatch copies the source
//! texture into the destination, which is what the kernel produces for rays
//! that hit nothing.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::layout::{validate_bindings, DESTINATION_TEXTURE, SOURCE_TEXTURE};
use crate::{
    Binding, BufferHandle, BufferUsage, BufferView, ComputeBackend, ComputeError, Kernel,
    ProgramHandle, TextureData, TextureHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    CompileKernel { kernel: Kernel, program: ProgramHandle },
    ReleaseProgram(ProgramHandle),
    CreateBuffer {
        buffer: BufferHandle,
        label: String,
        usage: BufferUsage,
        bytes: Vec<u8>,
    },
    ReleaseBuffer(BufferHandle),
    CreateTexture {
        texture: TextureHandle,
        width: u32,
        height: u32,
    },
    ReleaseTexture(TextureHandle),
    Dispatch {
        program: ProgramHandle,
        binds: Vec<Binding>,
        workgroups: [u32; 3],
    },
    Blit {
        source: TextureHandle,
        destination: TextureHandle,
    },
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    programs: HashMap<ProgramHandle, Kernel>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    textures: HashMap<TextureHandle, TextureData>,
    events: Vec<MockEvent>,
    fail_dispatch: bool,
}

impl MockState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn texture(&self, handle: TextureHandle) -> Result<&TextureData, ComputeError> {
        self.textures.get(&handle).ok_or_else(|| handle.unknown())
    }
}

#[derive(Default)]
pub struct MockCpu {
    state: Mutex<MockState>,
}

impl MockCpu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent dispatches fail after validation.
    pub fn set_dispatch_failure(&self, fail: bool) {
        self.state.lock().fail_dispatch = fail;
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }

    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.count(|e| matches!(e, MockEvent::Dispatch { .. }))
    }

    #[must_use]
    pub fn blit_count(&self) -> usize {
        self.count(|e| matches!(e, MockEvent::Blit { .. }))
    }

    #[must_use]
    pub fn texture_allocations(&self) -> usize {
        self.count(|e| matches!(e, MockEvent::CreateTexture { .. }))
    }

    #[must_use]
    pub fn texture_releases(&self) -> usize {
        self.count(|e| matches!(e, MockEvent::ReleaseTexture(_)))
    }

    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }

    /// Bytes of the most recently created buffer with the given label.
    #[must_use]
    pub fn last_buffer_bytes(&self, label: &str) -> Option<Vec<u8>> {
        self.state.lock().events.iter().rev().find_map(|e| match e {
            MockEvent::CreateBuffer { label: l, bytes, .. } if l == label => Some(bytes.clone()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&MockEvent) -> bool) -> usize {
        self.state.lock().events.iter().filter(|e| pred(e)).count()
    }
}

impl ComputeBackend for MockCpu {
    fn name(&self) -> &'static str {
        "mock-cpu"
    }

    fn compile_kernel(&self, kernel: Kernel, source: &str) -> Result<ProgramHandle, ComputeError> {
        if !source.contains("@compute") {
            return Err(ComputeError::ShaderCompilation(format!(
                "no compute entry point in {} source",
                kernel.label()
            )));
        }
        let mut state = self.state.lock();
        let program = ProgramHandle::from_raw(state.next_id());
        state.programs.insert(program, kernel);
        state.events.push(MockEvent::CompileKernel { kernel, program });
        Ok(program)
    }

    fn release_program(&self, program: ProgramHandle) {
        let mut state = self.state.lock();
        if state.programs.remove(&program).is_some() {
            state.events.push(MockEvent::ReleaseProgram(program));
        }
    }

    fn create_buffer(
        &self,
        label: &str,
        view: &BufferView,
        usage: BufferUsage,
    ) -> Result<BufferHandle, ComputeError> {
        view.validate()?;
        let mut state = self.state.lock();
        let buffer = BufferHandle::from_raw(state.next_id());
        state.buffers.insert(buffer, view.data.to_vec());
        state.events.push(MockEvent::CreateBuffer {
            buffer,
            label: label.to_owned(),
            usage,
            bytes: view.data.to_vec(),
        });
        Ok(buffer)
    }

    fn release_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        if state.buffers.remove(&buffer).is_some() {
            state.events.push(MockEvent::ReleaseBuffer(buffer));
        }
    }

    fn create_texture(
        &self,
        _label: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, ComputeError> {
        if width == 0 || height == 0 {
            return Err(ComputeError::TextureSizeMismatch {
                expected: (1, 1),
                actual: (width, height),
            });
        }
        let mut state = self.state.lock();
        let texture = TextureHandle::from_raw(state.next_id());
        state
            .textures
            .insert(texture, TextureData::filled(width, height, [0.0; 4]));
        state.events.push(MockEvent::CreateTexture { texture, width, height });
        Ok(texture)
    }

    fn write_texture(&self, texture: TextureHandle, data: &TextureData) -> Result<(), ComputeError> {
        let mut state = self.state.lock();
        let slot = state.textures.get_mut(&texture).ok_or_else(|| texture.unknown())?;
        if slot.size() != data.size() {
            return Err(ComputeError::TextureSizeMismatch {
                expected: slot.size(),
                actual: data.size(),
            });
        }
        *slot = data.clone();
        Ok(())
    }

    fn read_texture(&self, texture: TextureHandle) -> Result<TextureData, ComputeError> {
        self.state.lock().texture(texture).cloned()
    }

    fn release_texture(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        if state.textures.remove(&texture).is_some() {
            state.events.push(MockEvent::ReleaseTexture(texture));
        }
    }

    fn dispatch(
        &self,
        program: ProgramHandle,
        binds: &[Binding],
        workgroups: [u32; 3],
    ) -> Result<(), ComputeError> {
        let mut state = self.state.lock();
        let kernel = *state.programs.get(&program).ok_or_else(|| program.unknown())?;
        validate_bindings(&kernel, binds)?;
        for bind in binds {
            match bind {
                Binding::SampledTexture(t) | Binding::StorageTexture(t) => {
                    state.texture(*t)?;
                }
                Binding::StorageBuffer(b) | Binding::UniformBuffer(b) => {
                    if !state.buffers.contains_key(b) {
                        return Err(b.unknown());
                    }
                }
            }
        }
        state.events.push(MockEvent::Dispatch {
            program,
            binds: binds.to_vec(),
            workgroups,
        });
        if state.fail_dispatch {
            return Err(ComputeError::DispatchFailed("mock failure".to_owned()));
        }

        if let (Binding::SampledTexture(src), Binding::StorageTexture(dst)) = (
            binds[SOURCE_TEXTURE as usize],
            binds[DESTINATION_TEXTURE as usize],
        ) {
            let source = state.texture(src)?.clone();
            let destination = state.textures.get_mut(&dst).ok_or_else(|| dst.unknown())?;
            if destination.size() == source.size() {
                *destination = source;
            }
        }
        Ok(())
    }

    fn blit(&self, source: TextureHandle, destination: TextureHandle) -> Result<(), ComputeError> {
        let mut state = self.state.lock();
        let data = state.texture(source)?.clone();
        let target = state
            .textures
            .get_mut(&destination)
            .ok_or_else(|| destination.unknown())?;
        if target.size() != data.size() {
            return Err(ComputeError::TextureSizeMismatch {
                expected: target.size(),
                actual: data.size(),
            });
        }
        *target = data;
        state.events.push(MockEvent::Blit { source, destination });
        Ok(())
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;

    fn raymarch_program(cpu: &MockCpu) -> ProgramHandle {
        cpu.compile_kernel(Kernel::RayMarch, Kernel::RayMarch.default_source())
            .expect("embedded kernel compiles")
    }

    fn full_binds(cpu: &MockCpu, width: u32, height: u32) -> Vec<Binding> {
        let src = cpu.create_texture("src", width, height).unwrap();
        let dst = cpu.create_texture("dst", width, height).unwrap();
        let shapes = cpu
            .create_buffer("shapes", &BufferView::from_pod_slice(&[0u32; 16]), BufferUsage::Storage)
            .unwrap();
        let params = cpu
            .create_buffer("params", &BufferView::from_pod_slice(&[0u32; 4]), BufferUsage::Uniform)
            .unwrap();
        vec![
            Binding::SampledTexture(src),
            Binding::StorageTexture(dst),
            Binding::StorageBuffer(shapes),
            Binding::UniformBuffer(params),
        ]
    }

    #[test]
    fn source_without_entry_point_fails_to_compile() {
        let cpu = MockCpu::new();
        let result = cpu.compile_kernel(Kernel::RayMarch, "fn helper() {}");
        assert!(matches!(result, Err(ComputeError::ShaderCompilation(_))));
        assert!(cpu.events().is_empty());
    }

    #[test]
    fn mismatched_buffer_view_is_rejected() {
        let cpu = MockCpu::new();
        let bad = BufferView::new(vec![0u8; 12].into(), vec![4], 4);
        let result = cpu.create_buffer("bad", &bad, BufferUsage::Storage);
        assert!(matches!(result, Err(ComputeError::ShapeMismatch(_))));
        assert_eq!(cpu.live_buffers(), 0);
    }

    #[test]
    fn dispatch_records_grid_and_copies_source() {
        let cpu = MockCpu::new();
        let program = raymarch_program(&cpu);
        let binds = full_binds(&cpu, 4, 2);
        let Binding::SampledTexture(src) = binds[0] else { unreachable!() };
        let Binding::StorageTexture(dst) = binds[1] else { unreachable!() };
        let sky = TextureData::filled(4, 2, [0.2, 0.4, 0.8, 1.0]);
        cpu.write_texture(src, &sky).unwrap();

        cpu.dispatch(program, &binds, [1, 1, 1]).unwrap();

        assert_eq!(cpu.dispatch_count(), 1);
        assert_eq!(cpu.read_texture(dst).unwrap(), sky);
    }

    #[test]
    fn dispatch_with_released_buffer_fails() {
        let cpu = MockCpu::new();
        let program = raymarch_program(&cpu);
        let binds = full_binds(&cpu, 2, 2);
        let Binding::StorageBuffer(shapes) = binds[2] else { unreachable!() };
        cpu.release_buffer(shapes);

        let result = cpu.dispatch(program, &binds, [1, 1, 1]);
        assert_eq!(result, Err(shapes.unknown()));
        assert_eq!(cpu.dispatch_count(), 0);
    }

    #[test]
    fn wrong_layout_fails_before_recording() {
        let cpu = MockCpu::new();
        let program = raymarch_program(&cpu);
        let mut binds = full_binds(&cpu, 2, 2);
        binds.swap(2, 3);
        assert!(matches!(
            cpu.dispatch(program, &binds, [1, 1, 1]),
            Err(ComputeError::BindingMismatch { .. })
        ));
        assert_eq!(cpu.dispatch_count(), 0);
    }

    #[test]
    fn blit_requires_matching_sizes() {
        let cpu = MockCpu::new();
        let a = cpu.create_texture("a", 4, 4).unwrap();
        let b = cpu.create_texture("b", 8, 4).unwrap();
        assert!(matches!(
            cpu.blit(a, b),
            Err(ComputeError::TextureSizeMismatch { .. })
        ));
        assert_eq!(cpu.blit_count(), 0);
    }

    #[test]
    fn zero_sized_texture_is_rejected() {
        let cpu = MockCpu::new();
        assert!(cpu.create_texture("empty", 0, 10).is_err());
        assert_eq!(cpu.live_textures(), 0);
    }

    #[test]
    fn release_is_idempotent() {
        let cpu = MockCpu::new();
        let tex = cpu.create_texture("t", 1, 1).unwrap();
        cpu.release_texture(tex);
        cpu.release_texture(tex);
        assert_eq!(cpu.texture_releases(), 1);
        assert_eq!(cpu.live_textures(), 0);
    }
}
