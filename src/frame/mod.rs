//! Per-frame resources and the frame production cycle.
//!
//! This module coordinates CPU-GPU synchronization across multiple frames in
//! flight, letting the CPU prepare frame N+1 while the GPU still renders
//! frame N without ever overwriting data the GPU has not finished reading.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          FrameProducer                              │
//! │  Runs the per-frame cycle: select slot, wait for its prior marker,  │
//! │  repopulate upload regions, submit, stamp a new marker.             │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                            FrameRing                                │
//! │  Fixed-size circular array of FrameSlots, advanced round-robin      │
//! │  once per produced frame. Bounds how far the CPU can run ahead.     │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                            FrameSlot                                │
//! │  One frame's worth of reusable resources: a command context plus    │
//! │  pass/object/material upload regions, and the retirement marker     │
//! │  that says when the GPU is done with them.                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Frame Overlap
//!
//! With 3 slots the CPU may run up to 2 frames ahead of the GPU before the
//! ring forces a stall:
//!
//! ```text
//! Slot 0: [Frame 1] ─────► [Frame 4] ─────► [Frame 7] ─────►
//! Slot 1:       [Frame 2] ─────► [Frame 5] ─────►
//! Slot 2:             [Frame 3] ─────► [Frame 6] ─────►
//!
//! Frame 4 may begin only once Frame 1's marker has retired.
//! ```
//!
//! Each slot carries its own marker, so the producer waits for exactly the
//! slot it is about to reuse, never for the whole queue. The fixed ring size
//! is the backpressure mechanism: it bounds GPU-visible memory consumption
//! and caps CPU run-ahead.
//!
//! # Example
//!
//! ```ignore
//! let mut producer = device.create_frame_producer(3, &FrameCapacities::new(1, 64, 16))?;
//! let mut scene = SceneState::new(producer.frames_in_flight());
//!
//! loop {
//!     producer.begin_frame()?;        // may block on the slot's marker
//!     producer.populate(&mut scene);  // copy dirty constants
//!     // ... record draw commands against producer.current_slot() ...
//!     producer.submit_and_advance()?; // submit + stamp new marker
//! }
//!
//! producer.drain()?;                  // shutdown: wait out every slot
//! ```

mod producer;
mod ring;
mod slot;

pub use producer::FrameProducer;
pub use ring::{FrameRing, DEFAULT_FRAMES_IN_FLIGHT};
pub use slot::FrameSlot;

/// Element capacities for the upload regions of each frame slot.
///
/// Fixed at startup; regions do not grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameCapacities {
    /// Number of pass constant blocks (e.g. main pass + mirrored pass).
    pub passes: u32,
    /// Number of per-object constant blocks.
    pub objects: u32,
    /// Number of per-material constant blocks.
    pub materials: u32,
}

impl FrameCapacities {
    /// Create a capacity set. All counts must be at least 1.
    pub fn new(passes: u32, objects: u32, materials: u32) -> Self {
        Self {
            passes,
            objects,
            materials,
        }
    }
}
