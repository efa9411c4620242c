//! Projection of the flattened scene into the kernel's shape array
//!
//! Records come out 1:1 and in order with the flattened entries; the kernel
//! relies on that order to find each shape's children.

use compute::{BufferHandle, BufferUsage, BufferView, ComputeBackend, ComputeError};
use scene::{effective_scale, FlatEntry, FlattenedScene, HierarchyProvider, ShapeNode};

use crate::gpu_types::ShapeRecord;

/// Blend strength is stored in `[0, 1]` and widened by this factor on upload.
pub const BLEND_STRENGTH_SCALE: f32 = 3.0;

/// Shape records for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeBuffer {
    records: Vec<ShapeRecord>,
}

impl ShapeBuffer {
    /// Converts every flattened entry into a record.
    pub fn build<H: HierarchyProvider>(scene: &H, flattened: &FlattenedScene<H::Node>) -> Self {
        let records = flattened
            .iter()
            .filter_map(|entry| {
                let shape = scene.shape(entry.node);
                if shape.is_none() {
                    tracing::warn!(node = ?entry.node, "flattened node has no shape");
                }
                shape.map(|shape| shape_record(scene, entry, shape))
            })
            .collect();
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    #[must_use]
    pub fn record_count(&self) -> u32 {
        u32::try_from(self.records.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn view(&self) -> BufferView {
        BufferView::from_pod_slice(&self.records)
    }

    /// Uploads the records as a storage buffer. The caller releases it.
    ///
    /// # Errors
    ///
    /// Propagates backend allocation failures.
    pub fn upload(&self, backend: &dyn ComputeBackend) -> Result<BufferHandle, ComputeError> {
        backend.create_buffer("shapes", &self.view(), BufferUsage::Storage)
    }
}

fn shape_record<H: HierarchyProvider>(
    scene: &H,
    entry: &FlatEntry<H::Node>,
    shape: &ShapeNode,
) -> ShapeRecord {
    ShapeRecord {
        position: scene.world_position(entry.node).to_array(),
        rotation: scene.world_euler_degrees(entry.node).to_array(),
        size: effective_scale(scene, entry.node).to_array(),
        colour: shape.colour.to_array(),
        shape_type: shape.shape_type.as_i32(),
        operation: shape.operation.as_i32(),
        blend_strength: shape.blend_strength() * BLEND_STRENGTH_SCALE,
        num_children: i32::try_from(entry.child_shape_count).unwrap_or(i32::MAX),
    }
}
