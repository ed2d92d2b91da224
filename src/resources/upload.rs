//! Persistently-mapped upload storage for per-frame constants.
//!
//! An [`UploadRegion`] is a CPU-writable, GPU-readable array of fixed-stride
//! elements, used to stream per-frame data (transform matrices, material
//! parameters) to the GPU. The backing allocation is mapped once at creation
//! and unmapped once at destruction, never remapped per write.
//!
//! # Synchronization
//!
//! `write` performs no synchronization of its own. The governing discipline
//! is the frame ring: a region is only written while its owning frame slot's
//! retirement marker has been waited on, so the GPU can never be reading the
//! bytes being overwritten. Dropping a region while the GPU may still read
//! it is likewise prevented by draining the ring first.
//!
//! # Example
//!
//! ```ignore
//! let mut objects: UploadRegion<ObjectConstants> =
//!     UploadRegion::new(&device, 64, true, "object_constants")?;
//!
//! objects.write(item.object_index(), &constants);
//! let address = objects.gpu_address(item.object_index());
//! // Bind `address` as the object constant buffer for this draw.
//! ```

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use bytemuck::Pod;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Buffer;
use crate::types::{element_stride, BufferDescriptor, BufferUsage};

/// A persistently-mapped, fixed-capacity array of `T` in GPU-visible memory.
pub struct UploadRegion<T> {
    buffer: Arc<Buffer>,
    mapped: NonNull<u8>,
    base_address: u64,
    stride: u64,
    capacity: u32,
    constant_buffer: bool,
    _element: PhantomData<T>,
}

impl<T: Pod> UploadRegion<T> {
    /// Create a region with space for `capacity` elements.
    ///
    /// When `constant_buffer` is true, elements are spaced at the device's
    /// constant-buffer alignment (256 bytes) so each one is individually
    /// bindable; otherwise they are packed at `size_of::<T>()`.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero or the underlying allocation
    /// or mapping fails.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        capacity: u32,
        constant_buffer: bool,
        label: &str,
    ) -> Result<Self, GraphicsError> {
        if capacity == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload region '{label}' capacity cannot be zero"
            )));
        }

        let element_size = std::mem::size_of::<T>() as u64;
        if element_size == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload region '{label}' element type is zero-sized"
            )));
        }

        let stride = element_stride(element_size, constant_buffer);
        let usage = if constant_buffer {
            BufferUsage::UNIFORM | BufferUsage::MAP_WRITE
        } else {
            BufferUsage::MAP_WRITE
        };

        let descriptor =
            BufferDescriptor::new(stride * capacity as u64, usage).with_label(label.to_string());
        let buffer = device.create_buffer(&descriptor)?;
        let mapped = buffer.map()?;
        let base_address = buffer.device_address()?;

        Ok(Self {
            buffer,
            mapped,
            base_address,
            stride,
            capacity,
            constant_buffer,
            _element: PhantomData,
        })
    }

    /// Number of elements the region can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Spacing between consecutive elements in bytes.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Whether elements are laid out at constant-buffer alignment.
    pub fn is_constant_buffer(&self) -> bool {
        self.constant_buffer
    }

    /// The underlying GPU buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// Copy `value` into the element at `index`.
    ///
    /// Writes exactly `size_of::<T>()` bytes at byte offset
    /// `index * stride`. The caller must guarantee `index < capacity`;
    /// violations are caught by a debug assertion only.
    pub fn write(&mut self, index: u32, value: &T) {
        debug_assert!(
            index < self.capacity,
            "upload region write out of bounds: {index} >= {}",
            self.capacity
        );
        let bytes = bytemuck::bytes_of(value);
        unsafe {
            let dst = self.mapped.as_ptr().add((index as u64 * self.stride) as usize);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        }
    }

    /// Read back the element at `index` through the mapped pointer.
    ///
    /// Upload heaps are CPU-visible, so this is valid at any time on the
    /// writing thread; it exists for tests and debugging.
    pub fn read(&self, index: u32) -> T {
        debug_assert!(
            index < self.capacity,
            "upload region read out of bounds: {index} >= {}",
            self.capacity
        );
        unsafe {
            let src = self.mapped.as_ptr().add((index as u64 * self.stride) as usize);
            let bytes = std::slice::from_raw_parts(src, std::mem::size_of::<T>());
            bytemuck::pod_read_unaligned(bytes)
        }
    }

    /// Device-visible address of the element at `index`, for binding it as
    /// a shader input.
    pub fn gpu_address(&self, index: u32) -> u64 {
        debug_assert!(index < self.capacity);
        self.base_address + index as u64 * self.stride
    }
}

impl<T> Drop for UploadRegion<T> {
    fn drop(&mut self) {
        self.buffer.unmap();
    }
}

// The mapped pointer aliases memory owned by `buffer`, which is kept alive
// by the Arc. Writes require `&mut self`, so exclusive access is enforced by
// the borrow checker; cross-thread moves are safe.
unsafe impl<T: Send> Send for UploadRegion<T> {}
unsafe impl<T: Sync> Sync for UploadRegion<T> {}

impl<T> std::fmt::Debug for UploadRegion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRegion")
            .field("capacity", &self.capacity)
            .field("stride", &self.stride)
            .field("constant_buffer", &self.constant_buffer)
            .field("buffer", &self.buffer.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::types::ObjectConstants;
    use bytemuck::Zeroable;

    fn create_test_device() -> Arc<GraphicsDevice> {
        let instance = GraphicsInstance::new().unwrap();
        instance.create_device().unwrap()
    }

    /// 70-byte element with 1-byte alignment, to exercise stride rounding.
    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, Zeroable)]
    struct Odd([u8; 70]);

    #[test]
    fn test_constant_buffer_stride_rounds_up() {
        let device = create_test_device();
        let region: UploadRegion<Odd> = UploadRegion::new(&device, 4, true, "odd_cb").unwrap();
        assert_eq!(region.stride(), 256);
        assert_eq!(region.buffer().size(), 4 * 256);
    }

    #[test]
    fn test_raw_stride_is_element_size() {
        let device = create_test_device();
        let region: UploadRegion<Odd> = UploadRegion::new(&device, 4, false, "odd_raw").unwrap();
        assert_eq!(region.stride(), 70);
        assert_eq!(region.buffer().size(), 4 * 70);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let device = create_test_device();
        let mut region: UploadRegion<Odd> = UploadRegion::new(&device, 4, true, "odd").unwrap();

        let mut value = Odd([0; 70]);
        for (i, byte) in value.0.iter_mut().enumerate() {
            *byte = i as u8;
        }

        region.write(2, &value);
        let back = region.read(2);
        assert_eq!(bytemuck::bytes_of(&back), bytemuck::bytes_of(&value));

        // Neighbors are untouched.
        assert_eq!(region.read(1), Odd([0; 70]));
        assert_eq!(region.read(3), Odd([0; 70]));
    }

    #[test]
    fn test_gpu_address_spacing() {
        let device = create_test_device();
        let region: UploadRegion<ObjectConstants> =
            UploadRegion::new(&device, 8, true, "objects").unwrap();

        let base = region.gpu_address(0);
        assert_eq!(region.gpu_address(1), base + 256);
        assert_eq!(region.gpu_address(7), base + 7 * 256);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let device = create_test_device();
        let result: Result<UploadRegion<ObjectConstants>, _> =
            UploadRegion::new(&device, 0, true, "empty");
        assert!(result.is_err());
    }

    #[test]
    fn test_mapping_survives_many_writes() {
        let device = create_test_device();
        let mut region: UploadRegion<ObjectConstants> =
            UploadRegion::new(&device, 2, true, "objects").unwrap();

        // Mapped once; repeated writes reuse the same pointer.
        for i in 0..100u32 {
            let mut constants = ObjectConstants::default();
            constants.world[3][0] = i as f32;
            region.write(i % 2, &constants);
        }
        assert_eq!(region.read(1).world[3][0], 99.0);
        assert_eq!(region.read(0).world[3][0], 98.0);
    }
}
