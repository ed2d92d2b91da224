//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources.
//! It is created by [`GraphicsInstance::create_device`].

use std::sync::{Arc, RwLock, Weak};

use crate::backend::GpuBackend;
use crate::error::GraphicsError;
use crate::frame::{FrameCapacities, FrameProducer};
use crate::instance::GraphicsInstance;
use crate::resources::{Buffer, CommandContext};
use crate::sync::SubmissionPacer;
use crate::types::{BufferDescriptor, CONSTANT_BUFFER_ALIGNMENT};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum buffer size.
    pub max_buffer_size: u64,
    /// Required spacing of individually-bindable constant elements.
    pub constant_buffer_alignment: u64,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_buffer_size: 1 << 30, // 1 GB
            constant_buffer_alignment: CONSTANT_BUFFER_ALIGNMENT,
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// The device is created by [`GraphicsInstance::create_device`] and provides
/// methods for creating buffers, command contexts, and the frame
/// synchronization machinery built on them.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across
/// threads. All resource creation methods use interior mutability where
/// needed.
pub struct GraphicsDevice {
    instance: Arc<GraphicsInstance>,
    name: String,
    capabilities: DeviceCapabilities,
    // Track allocated buffers (weak references for cleanup/debugging)
    buffers: RwLock<Vec<Weak<Buffer>>>,
}

impl GraphicsDevice {
    /// Create a new graphics device (called by GraphicsInstance).
    pub(crate) fn new(instance: Arc<GraphicsInstance>, name: String) -> Self {
        Self {
            instance,
            name,
            capabilities: DeviceCapabilities::default(),
            buffers: RwLock::new(Vec::new()),
        }
    }

    /// Get the parent instance.
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Get the GPU backend (internal use only).
    pub(crate) fn backend(&self) -> &Arc<dyn GpuBackend> {
        self.instance.backend()
    }

    /// Create a GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size exceeds device limits or
    /// allocation fails.
    pub fn create_buffer(
        self: &Arc<Self>,
        descriptor: &BufferDescriptor,
    ) -> Result<Arc<Buffer>, GraphicsError> {
        if descriptor.size > self.capabilities.max_buffer_size {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer size {} exceeds maximum {}",
                descriptor.size, self.capabilities.max_buffer_size
            )));
        }

        if descriptor.size == 0 {
            return Err(GraphicsError::InvalidParameter(
                "buffer size cannot be zero".to_string(),
            ));
        }

        let raw = self.backend().create_buffer(descriptor)?;
        let buffer = Arc::new(Buffer::new(Arc::downgrade(self), descriptor.clone(), raw));

        if let Ok(mut buffers) = self.buffers.write() {
            buffers.push(Arc::downgrade(&buffer));
        }

        log::trace!(
            "GraphicsDevice: created buffer {:?}, size={}",
            descriptor.label,
            descriptor.size
        );

        Ok(buffer)
    }

    /// Create a command-recording context.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying allocator cannot be created.
    pub fn create_command_context(self: &Arc<Self>) -> Result<CommandContext, GraphicsError> {
        let raw = self.backend().create_command_context()?;
        log::trace!("GraphicsDevice: created command context");
        Ok(CommandContext::new(Arc::downgrade(self), raw))
    }

    /// Submit the commands recorded through a context to the device's
    /// graphics queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the submission fails or the device is lost.
    pub fn submit(&self, context: &CommandContext) -> Result<(), GraphicsError> {
        self.backend().submit_context(context.raw())
    }

    /// Create a submission pacer over a fresh timeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeline object cannot be created.
    pub fn create_submission_pacer(self: &Arc<Self>) -> Result<SubmissionPacer, GraphicsError> {
        SubmissionPacer::new(self)
    }

    /// Create a frame producer: a ring of `frames_in_flight` frame slots
    /// plus a pacer, ready to run the per-frame cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if slot resources cannot be allocated.
    pub fn create_frame_producer(
        self: &Arc<Self>,
        frames_in_flight: usize,
        capacities: &FrameCapacities,
    ) -> Result<FrameProducer, GraphicsError> {
        FrameProducer::new(self, frames_in_flight, capacities)
    }

    /// Get the number of live buffers created by this device.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .read()
            .map(|b| b.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        if let Ok(mut buffers) = self.buffers.write() {
            buffers.retain(|w| w.strong_count() > 0);
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BufferUsage;

    fn create_test_device() -> Arc<GraphicsDevice> {
        let instance = GraphicsInstance::new().unwrap();
        instance.create_device().unwrap()
    }

    #[test]
    fn test_device_name() {
        let device = create_test_device();
        assert_eq!(device.name(), "Dummy Adapter");
    }

    #[test]
    fn test_create_buffer() {
        let device = create_test_device();
        let buffer = device
            .create_buffer(&BufferDescriptor::new(1024, BufferUsage::UNIFORM))
            .unwrap();
        assert_eq!(buffer.size(), 1024);
        assert_eq!(device.buffer_count(), 1);
    }

    #[test]
    fn test_create_buffer_zero_size() {
        let device = create_test_device();
        let result = device.create_buffer(&BufferDescriptor::new(0, BufferUsage::UNIFORM));
        assert!(result.is_err());
    }

    #[test]
    fn test_create_buffer_too_large() {
        let device = create_test_device();
        let result = device.create_buffer(&BufferDescriptor::new(
            device.capabilities().max_buffer_size + 1,
            BufferUsage::UNIFORM,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_resource_cleanup() {
        let device = create_test_device();
        {
            let _buffer = device
                .create_buffer(&BufferDescriptor::new(1024, BufferUsage::UNIFORM))
                .unwrap();
            assert_eq!(device.buffer_count(), 1);
        }
        // Buffer dropped
        device.cleanup_dead_resources();
        assert_eq!(device.buffer_count(), 0);
    }

    #[test]
    fn test_create_command_context() {
        let device = create_test_device();
        let context = device.create_command_context().unwrap();
        context.reset().unwrap();
        device.submit(&context).unwrap();
    }
}
