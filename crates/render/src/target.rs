use compute::{ComputeBackend, ComputeError, TextureHandle};

/// Single-slot render target keyed on pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderTargetSlot {
    #[default]
    Uninitialized,
    Allocated {
        width: u32,
        height: u32,
        texture: TextureHandle,
    },
}

impl RenderTargetSlot {
    #[must_use]
    pub const fn size(&self) -> Option<(u32, u32)> {
        match self {
            Self::Uninitialized => None,
            Self::Allocated { width, height, .. } => Some((*width, *height)),
        }
    }

    /// Returns a target of exactly `width` x `height`, releasing and
    /// reallocating only when the size differs. The flag is true when a new
    /// texture was created.
    ///
    /// # Errors
    ///
    /// Propagates allocation failures; the slot is left uninitialized.
    pub fn ensure(
        &mut self,
        backend: &dyn ComputeBackend,
        width: u32,
        height: u32,
    ) -> Result<(TextureHandle, bool), ComputeError> {
        if let Self::Allocated { width: w, height: h, texture } = *self {
            if (w, h) == (width, height) {
                return Ok((texture, false));
            }
        }
        self.release(backend);
        let texture = backend.create_texture("march target", width, height)?;
        tracing::debug!(width, height, "allocated render target");
        *self = Self::Allocated { width, height, texture };
        Ok((texture, true))
    }

    pub fn release(&mut self, backend: &dyn ComputeBackend) {
        if let Self::Allocated { texture, .. } = std::mem::take(self) {
            backend.release_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute::MockCpu;

    #[test]
    fn same_size_reuses_texture() {
        let cpu = MockCpu::new();
        let mut slot = RenderTargetSlot::default();
        let (first, fresh) = slot.ensure(&cpu, 64, 32).unwrap();
        assert!(fresh);
        let (second, fresh) = slot.ensure(&cpu, 64, 32).unwrap();
        assert!(!fresh);
        assert_eq!(first, second);
        assert_eq!(cpu.texture_allocations(), 1);
    }

    #[test]
    fn resize_releases_before_allocating() {
        let cpu = MockCpu::new();
        let mut slot = RenderTargetSlot::default();
        let (old, _) = slot.ensure(&cpu, 64, 32).unwrap();
        let (new, fresh) = slot.ensure(&cpu, 32, 32).unwrap();
        assert!(fresh);
        assert_ne!(old, new);
        assert_eq!(slot.size(), Some((32, 32)));
        assert_eq!(cpu.live_textures(), 1);
        assert_eq!(cpu.texture_releases(), 1);
    }

    #[test]
    fn failed_allocation_leaves_slot_empty() {
        let cpu = MockCpu::new();
        let mut slot = RenderTargetSlot::default();
        slot.ensure(&cpu, 8, 8).unwrap();
        assert!(slot.ensure(&cpu, 0, 8).is_err());
        assert_eq!(slot, RenderTargetSlot::Uninitialized);
        assert_eq!(cpu.live_textures(), 0);
    }
}
