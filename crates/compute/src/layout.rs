use crate::{Binding, ComputeError, Kernel};

pub const SOURCE_TEXTURE: u32 = 0;
pub const DESTINATION_TEXTURE: u32 = 1;
pub const SHAPES: u32 = 2;
pub const PARAMS: u32 = 3;

/// Edge length of the square pixel tile handled by one workgroup.
/// Must match `@workgroup_size` in `raymarch.wgsl`.
pub const THREAD_GROUP_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    SampledTexture,
    StorageTexture,
    StorageBuffer,
    UniformBuffer,
}

/// Slot kinds expected by each kernel, indexed by binding number.
#[must_use]
pub const fn binding_layout(kernel: &Kernel) -> &'static [BindingKind] {
    match kernel {
        Kernel::RayMarch => &[
            BindingKind::SampledTexture,
            BindingKind::StorageTexture,
            BindingKind::StorageBuffer,
            BindingKind::UniformBuffer,
        ],
    }
}

// The uniform block is the last slot of the marching layout.
const _: () = assert!(binding_layout(&Kernel::RayMarch).len() == PARAMS as usize + 1);

/// Return expected number of bindings for each kernel.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn binding_count(kernel: &Kernel) -> u32 {
    binding_layout(kernel).len() as u32
}

/// Checks a bind list against the kernel layout.
///
/// # Errors
///
/// Returns [`ComputeError::BindingMismatch`] when the count or any slot kind
/// differs from [`binding_layout`].
pub fn validate_bindings(kernel: &Kernel, binds: &[Binding]) -> Result<(), ComputeError> {
    let expected = binding_layout(kernel);
    if binds.len() != expected.len() {
        return Err(ComputeError::BindingMismatch {
            kernel: *kernel,
            reason: "wrong number of bindings",
        });
    }
    if binds.iter().zip(expected).any(|(bind, kind)| bind.kind() != *kind) {
        return Err(ComputeError::BindingMismatch {
            kernel: *kernel,
            reason: "binding kind does not match kernel layout",
        });
    }
    Ok(())
}

/// Workgroup grid covering a `width` x `height` image with square tiles.
#[must_use]
pub const fn workgroups_for(width: u32, height: u32) -> [u32; 3] {
    [
        width.div_ceil(THREAD_GROUP_SIZE),
        height.div_ceil(THREAD_GROUP_SIZE),
        1,
    ]
}
