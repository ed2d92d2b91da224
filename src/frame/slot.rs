//! One frame's worth of reusable GPU resources.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::frame::FrameCapacities;
use crate::resources::{CommandContext, UploadRegion};
use crate::types::{MaterialConstants, ObjectConstants, PassConstants};

/// The bundle of resources that must not be shared across
/// concurrently-executing frames: a command-recording context plus the
/// upload regions the frame's draws read from, and the retirement marker
/// that says when the GPU is done with all of it.
///
/// A slot performs no waiting itself; the wait policy lives in the
/// [`SubmissionPacer`](crate::sync::SubmissionPacer) so it can be tested
/// independently of resource layout.
pub struct FrameSlot {
    command_context: CommandContext,
    pass_constants: UploadRegion<PassConstants>,
    object_constants: UploadRegion<ObjectConstants>,
    material_constants: UploadRegion<MaterialConstants>,
    /// Marker that, once retired, means this slot's resources are free.
    /// 0 = never submitted.
    retire_marker: u64,
}

impl FrameSlot {
    /// Allocate a slot's recording context and upload regions.
    ///
    /// `slot_index` is only used to label the allocations.
    ///
    /// # Errors
    ///
    /// Returns an error if any capacity is zero or an allocation fails.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        capacities: &FrameCapacities,
        slot_index: usize,
    ) -> Result<Self, GraphicsError> {
        let command_context = device.create_command_context()?;
        let pass_constants = UploadRegion::new(
            device,
            capacities.passes,
            true,
            &format!("frame{slot_index}_pass_constants"),
        )?;
        let object_constants = UploadRegion::new(
            device,
            capacities.objects,
            true,
            &format!("frame{slot_index}_object_constants"),
        )?;
        let material_constants = UploadRegion::new(
            device,
            capacities.materials,
            true,
            &format!("frame{slot_index}_material_constants"),
        )?;

        Ok(Self {
            command_context,
            pass_constants,
            object_constants,
            material_constants,
            retire_marker: 0,
        })
    }

    /// The slot's command-recording context.
    pub fn command_context(&self) -> &CommandContext {
        &self.command_context
    }

    /// Pass constant region.
    pub fn pass_constants(&self) -> &UploadRegion<PassConstants> {
        &self.pass_constants
    }

    /// Pass constant region, writable.
    pub fn pass_constants_mut(&mut self) -> &mut UploadRegion<PassConstants> {
        &mut self.pass_constants
    }

    /// Object constant region.
    pub fn object_constants(&self) -> &UploadRegion<ObjectConstants> {
        &self.object_constants
    }

    /// Object constant region, writable.
    pub fn object_constants_mut(&mut self) -> &mut UploadRegion<ObjectConstants> {
        &mut self.object_constants
    }

    /// Material constant region.
    pub fn material_constants(&self) -> &UploadRegion<MaterialConstants> {
        &self.material_constants
    }

    /// Material constant region, writable.
    pub fn material_constants_mut(&mut self) -> &mut UploadRegion<MaterialConstants> {
        &mut self.material_constants
    }

    /// The marker stamped at this slot's last submission (0 = never
    /// submitted).
    pub fn retire_marker(&self) -> u64 {
        self.retire_marker
    }

    pub(crate) fn set_retire_marker(&mut self, marker: u64) {
        self.retire_marker = marker;
    }
}

impl std::fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSlot")
            .field("retire_marker", &self.retire_marker)
            .field("passes", &self.pass_constants.capacity())
            .field("objects", &self.object_constants.capacity())
            .field("materials", &self.material_constants.capacity())
            .finish()
    }
}

// Ensure FrameSlot is Send + Sync
static_assertions::assert_impl_all!(FrameSlot: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;

    fn create_test_device() -> Arc<GraphicsDevice> {
        let instance = GraphicsInstance::new().unwrap();
        instance.create_device().unwrap()
    }

    #[test]
    fn test_slot_creation() {
        let device = create_test_device();
        let slot = FrameSlot::new(&device, &FrameCapacities::new(2, 8, 4), 0).unwrap();

        assert_eq!(slot.retire_marker(), 0);
        assert_eq!(slot.pass_constants().capacity(), 2);
        assert_eq!(slot.object_constants().capacity(), 8);
        assert_eq!(slot.material_constants().capacity(), 4);
        // Three upload buffers live on the device.
        assert_eq!(device.buffer_count(), 3);
    }

    #[test]
    fn test_slot_zero_capacity_rejected() {
        let device = create_test_device();
        let result = FrameSlot::new(&device, &FrameCapacities::new(1, 0, 4), 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_slot_regions_are_constant_buffers() {
        let device = create_test_device();
        let slot = FrameSlot::new(&device, &FrameCapacities::new(1, 1, 1), 0).unwrap();

        assert!(slot.pass_constants().is_constant_buffer());
        assert_eq!(slot.object_constants().stride() % 256, 0);
    }
}
