//! GPU buffer resource.

use std::ptr::NonNull;
use std::sync::{Arc, Weak};

use crate::backend::GpuBuffer;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice::create_buffer`] and are
/// reference-counted. They hold a weak reference back to their parent
/// device.
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    descriptor: BufferDescriptor,
    raw: GpuBuffer,
}

impl Buffer {
    /// Create a new buffer (called by GraphicsDevice).
    pub(crate) fn new(
        device: Weak<GraphicsDevice>,
        descriptor: BufferDescriptor,
        raw: GpuBuffer,
    ) -> Self {
        Self {
            device,
            descriptor,
            raw,
        }
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Get the raw backend handle.
    pub(crate) fn raw(&self) -> &GpuBuffer {
        &self.raw
    }

    fn require_device(&self) -> Result<Arc<GraphicsDevice>, GraphicsError> {
        self.device
            .upgrade()
            .ok_or_else(|| GraphicsError::Device("device has been dropped".to_string()))
    }

    /// Map the buffer for CPU access. The pointer stays valid until
    /// [`unmap`](Self::unmap).
    pub(crate) fn map(&self) -> Result<NonNull<u8>, GraphicsError> {
        let device = self.require_device()?;
        device.backend().map_buffer(&self.raw)
    }

    /// Unmap the buffer. No-op if the device is already gone.
    pub(crate) fn unmap(&self) {
        if let Some(device) = self.device.upgrade() {
            device.backend().unmap_buffer(&self.raw);
        }
    }

    /// Device-visible base address of the buffer.
    pub(crate) fn device_address(&self) -> Result<u64, GraphicsError> {
        let device = self.require_device()?;
        Ok(device.backend().buffer_device_address(&self.raw))
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::types::BufferUsage;

    fn create_test_device() -> Arc<GraphicsDevice> {
        let instance = GraphicsInstance::new().unwrap();
        instance.create_device().unwrap()
    }

    #[test]
    fn test_buffer_debug() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::UNIFORM).with_label("test"))
            .unwrap();
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn test_buffer_map_roundtrip() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(
                256,
                BufferUsage::UNIFORM | BufferUsage::MAP_WRITE,
            ))
            .unwrap();

        let ptr = buffer.map().unwrap();
        unsafe {
            ptr.as_ptr().write(0xAB);
            assert_eq!(ptr.as_ptr().read(), 0xAB);
        }
        buffer.unmap();
    }

    #[test]
    fn test_buffer_device_address() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
            .unwrap();
        assert_ne!(buffer.device_address().unwrap(), 0);
    }
}
