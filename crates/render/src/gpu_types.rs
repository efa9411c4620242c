//! GPU-compatible type definitions for the marching kernel
//!
//! Both structs are uploaded byte-for-byte, so their layouts must match
//! `Shape` and `Params` in `shaders/raymarch.wgsl`.

use bytemuck::{Pod, Zeroable};

/// One shape as the kernel reads it from the storage buffer.
///
/// 13 floats and 3 ints, tightly packed: 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShapeRecord {
    /// World position
    pub position: [f32; 3],
    /// World rotation as Euler degrees
    pub rotation: [f32; 3],
    /// Effective scale
    pub size: [f32; 3],
    pub colour: [f32; 3],
    pub shape_type: i32,
    pub operation: i32,
    /// Blend strength already multiplied by the blend scale
    pub blend_strength: f32,
    /// Direct shape children following this record
    pub num_children: i32,
}

const _: () = assert!(std::mem::size_of::<ShapeRecord>() == 64);

/// Per-frame uniforms: camera matrices, light and shape count.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MarchParams {
    pub camera_to_world: [[f32; 4]; 4],
    pub camera_inverse_projection: [[f32; 4]; 4],
    /// Light position when `position_light` is 1, light direction otherwise
    pub light: [f32; 3],
    pub position_light: u32,
    pub shape_count: u32,
    pub _pad: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<MarchParams>() == 160);
