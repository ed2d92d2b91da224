//! Command-recording context.

use std::sync::{Arc, Weak};

use crate::backend::GpuCommandContext;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// A command-recording context (command allocator).
///
/// Each frame slot owns one context so that command memory for one frame can
/// be recycled independently of the others. A context may only be
/// [`reset`](Self::reset) once the GPU has retired the marker most recently
/// stamped on its owning slot; the frame producer enforces that ordering.
pub struct CommandContext {
    device: Weak<GraphicsDevice>,
    raw: GpuCommandContext,
}

impl CommandContext {
    /// Create a new context (called by GraphicsDevice).
    pub(crate) fn new(device: Weak<GraphicsDevice>, raw: GpuCommandContext) -> Self {
        Self { device, raw }
    }

    /// Get the raw backend handle.
    pub(crate) fn raw(&self) -> &GpuCommandContext {
        &self.raw
    }

    /// Reset the context, recycling its command memory for a new frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is gone or lost.
    pub fn reset(&self) -> Result<(), GraphicsError> {
        let device = self
            .device
            .upgrade()
            .ok_or_else(|| GraphicsError::Device("device has been dropped".to_string()))?;
        device.backend().reset_command_context(&self.raw)
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("raw", &self.raw)
            .finish()
    }
}

// Ensure CommandContext is Send + Sync
static_assertions::assert_impl_all!(CommandContext: Send, Sync);
