//! Buffer types and descriptors.

use bitflags::bitflags;

/// Minimum spacing between individually-bindable constant-buffer elements.
///
/// Explicit graphics APIs require constant (uniform) data bound at an offset
/// to be aligned to 256 bytes, so constant arrays are laid out with their
/// element size rounded up to this value.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be used as a uniform (constant) buffer.
        const UNIFORM = 1 << 2;
        /// Buffer can be used as a storage buffer.
        const STORAGE = 1 << 3;
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 4;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 5;
        /// Buffer is mappable for CPU read.
        const MAP_READ = 1 << 6;
        /// Buffer is mappable for CPU write.
        const MAP_WRITE = 1 << 7;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Align a value up to the given alignment.
#[inline]
pub fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Compute the per-element stride for an upload region.
///
/// Constant-buffer elements must be spaced at [`CONSTANT_BUFFER_ALIGNMENT`];
/// other elements (vertex/index data) are packed at their natural size.
#[inline]
pub fn element_stride(element_size: u64, constant_buffer: bool) -> u64 {
    if constant_buffer {
        align_up(element_size, CONSTANT_BUFFER_ALIGNMENT)
    } else {
        element_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(255, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(100, 64), 128);
    }

    #[test]
    fn test_element_stride_constant_buffer() {
        // A 70-byte element rounds up to one full constant-buffer slot.
        assert_eq!(element_stride(70, true), 256);
        assert_eq!(element_stride(256, true), 256);
        assert_eq!(element_stride(257, true), 512);
    }

    #[test]
    fn test_element_stride_raw() {
        // Vertex/index elements keep their natural size.
        assert_eq!(element_stride(70, false), 70);
        assert_eq!(element_stride(12, false), 12);
    }

    #[test]
    fn test_descriptor_builder() {
        let desc = BufferDescriptor::new(1024, BufferUsage::UNIFORM | BufferUsage::MAP_WRITE)
            .with_label("pass_constants");
        assert_eq!(desc.size, 1024);
        assert!(desc.usage.contains(BufferUsage::MAP_WRITE));
        assert_eq!(desc.label.as_deref(), Some("pass_constants"));
    }
}
