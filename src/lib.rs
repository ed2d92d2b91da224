//! # framepace
//!
//! Frame pacing and per-frame GPU resource management with fence-based
//! CPU-GPU synchronization.
//!
//! ## Overview
//!
//! This crate provides the machinery that lets a CPU producer thread safely
//! overlap with an asynchronously-consuming GPU queue:
//!
//! - [`UploadRegion`] - persistently-mapped, CPU-writable, GPU-readable
//!   constant storage
//! - [`FrameSlot`] / [`FrameRing`] - per-frame resource bundles cycled
//!   round-robin
//! - [`SubmissionPacer`] - monotonic retirement markers over a device
//!   timeline
//! - [`FrameProducer`] - the per-frame cycle: wait, populate, submit, stamp
//! - [`GpuBackend`] - the device abstraction the core runs on; the dummy
//!   backend makes the whole pipeline testable without GPU hardware
//!
//! The correctness contract throughout: the CPU never writes into memory
//! the GPU may still be reading, enforced by waiting on a slot's retirement
//! marker before the slot is reused.
//!
//! ## Example
//!
//! ```ignore
//! use framepace::{FrameCapacities, GraphicsInstance, SceneState};
//!
//! let instance = GraphicsInstance::new()?;
//! let device = instance.create_device()?;
//! let mut producer = device.create_frame_producer(3, &FrameCapacities::new(1, 64, 16))?;
//! let mut scene = SceneState::new(producer.frames_in_flight());
//!
//! loop {
//!     producer.begin_frame()?;
//!     producer.populate(&mut scene);
//!     // record draw commands against producer.current_slot() ...
//!     producer.submit_and_advance()?;
//! }
//! ```

pub mod app;
pub mod backend;
pub mod device;
pub mod error;
pub mod frame;
pub mod instance;
pub mod resources;
pub mod scene;
pub mod sync;
pub mod types;

// Re-export main types for convenience
pub use app::{run_frames, FrameApp};
pub use backend::{dummy::DummyBackend, GpuBackend};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use frame::{FrameCapacities, FrameProducer, FrameRing, FrameSlot, DEFAULT_FRAMES_IN_FLIGHT};
pub use instance::{AdapterInfo, AdapterType, GraphicsInstance};
pub use resources::{Buffer, CommandContext, UploadRegion};
pub use scene::{MaterialSlot, RenderItem, SceneState};
pub use sync::SubmissionPacer;
pub use types::{
    BufferDescriptor, BufferUsage, LightConstants, Mat4, MaterialConstants, ObjectConstants,
    PassConstants, CONSTANT_BUFFER_ALIGNMENT, MAT4_IDENTITY, MAX_LIGHTS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library.
///
/// This only emits a log line; nothing requires calling it.
pub fn init() {
    log::info!("framepace v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy Backend");
    }
}
