//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the device-level
//! operations the frame synchronization core depends on: buffer allocation,
//! persistent mapping, timeline (completion-counter) objects, queue-ordered
//! completion signals, and command-context lifecycle.
//!
//! # Available Backends
//!
//! - `dummy` (default): host-memory backend for testing and headless
//!   development. Mapped writes round-trip through real allocations, and
//!   timeline completion can be driven manually to simulate GPU lag.
//!
//! Real GPU backends plug in behind [`GpuBackend`]; each would add its own
//! variant to the handle enums below.

pub mod dummy;

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// Handle to a GPU buffer resource.
pub enum GpuBuffer {
    /// Dummy backend: a host allocation standing in for GPU-visible memory.
    Dummy {
        memory: Box<[UnsafeCell<u8>]>,
        device_address: u64,
        mapped: AtomicBool,
    },
}

impl GpuBuffer {
    /// Size of the backing allocation in bytes.
    pub fn size(&self) -> u64 {
        match self {
            Self::Dummy { memory, .. } => memory.len() as u64,
        }
    }
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dummy {
                memory,
                device_address,
                mapped,
            } => f
                .debug_struct("GpuBuffer::Dummy")
                .field("size", &memory.len())
                .field("device_address", device_address)
                .field("mapped", &mapped.load(Ordering::Relaxed))
                .finish(),
        }
    }
}

// The interior mutability of the dummy backing store is governed by the
// frame discipline: the single producer thread writes through the mapped
// pointer, and slot reuse is gated on marker retirement.
unsafe impl Send for GpuBuffer {}
unsafe impl Sync for GpuBuffer {}

/// Handle to a timeline object: a monotonically increasing completion
/// counter the device advances as submitted work finishes.
///
/// Cloning a handle shares the underlying counter, so a clone can observe
/// (or, in the dummy backend, drive) completion from another thread.
pub enum GpuTimeline {
    /// Dummy backend timeline.
    Dummy { shared: Arc<dummy::TimelineShared> },
}

impl Clone for GpuTimeline {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy { shared } => Self::Dummy {
                shared: Arc::clone(shared),
            },
        }
    }
}

impl fmt::Debug for GpuTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dummy { shared } => f
                .debug_struct("GpuTimeline::Dummy")
                .field("completed", &shared.completed())
                .finish(),
        }
    }
}

/// Handle to a command-recording context (command allocator).
pub enum GpuCommandContext {
    /// Dummy backend context; tracks reuse for diagnostics.
    Dummy { reset_count: AtomicU64 },
}

impl fmt::Debug for GpuCommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dummy { reset_count } => f
                .debug_struct("GpuCommandContext::Dummy")
                .field("reset_count", &reset_count.load(Ordering::Relaxed))
                .finish(),
        }
    }
}

/// GPU backend trait for abstracting different GPU APIs.
///
/// All operations act on the backend's single graphics queue. "Finished" is
/// defined by submission order on that queue: a timeline reaching value `n`
/// means every command submitted before the signal of `n` has retired.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Map a buffer for CPU access.
    ///
    /// The returned pointer stays valid until
    /// [`unmap_buffer`](Self::unmap_buffer); callers map once at creation
    /// and unmap once at destruction, never per write.
    fn map_buffer(&self, buffer: &GpuBuffer) -> Result<NonNull<u8>, GraphicsError>;

    /// Unmap a previously mapped buffer.
    fn unmap_buffer(&self, buffer: &GpuBuffer);

    /// Device-visible base address of the buffer, for binding as a shader
    /// input.
    fn buffer_device_address(&self, buffer: &GpuBuffer) -> u64;

    /// Create a command-recording context.
    fn create_command_context(&self) -> Result<GpuCommandContext, GraphicsError>;

    /// Reset a command context for reuse. Only valid once the work recorded
    /// through it has retired.
    fn reset_command_context(&self, context: &GpuCommandContext) -> Result<(), GraphicsError>;

    /// Submit the commands recorded through a context to the queue.
    fn submit_context(&self, context: &GpuCommandContext) -> Result<(), GraphicsError>;

    /// Create a timeline object with its completion counter at zero.
    fn create_timeline(&self) -> Result<GpuTimeline, GraphicsError>;

    /// Enqueue an instruction that advances the timeline to `value` once all
    /// previously-submitted work on the queue has finished.
    fn signal_timeline(&self, timeline: &GpuTimeline, value: u64) -> Result<(), GraphicsError>;

    /// Query the timeline's current completed value (non-blocking).
    fn timeline_value(&self, timeline: &GpuTimeline) -> Result<u64, GraphicsError>;

    /// Block until the timeline reaches `value`, or until `timeout` elapses.
    ///
    /// Returns `Ok(true)` if the value was reached, `Ok(false)` on timeout,
    /// and [`GraphicsError::DeviceLost`] if the device can never complete
    /// the wait.
    fn wait_timeline(
        &self,
        timeline: &GpuTimeline,
        value: u64,
        timeout: Option<Duration>,
    ) -> Result<bool, GraphicsError>;
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    #[cfg(feature = "dummy")]
    {
        log::info!("Using dummy backend");
        Ok(Arc::new(dummy::DummyBackend::new()))
    }
    #[cfg(not(feature = "dummy"))]
    {
        Err(GraphicsError::Device(
            "no GPU backend available; enable a backend feature or inject one".to_string(),
        ))
    }
}
