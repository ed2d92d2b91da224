//! Round-robin allocation of frame slots to successive frames.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::frame::{FrameCapacities, FrameSlot};

/// Default number of frames in flight.
///
/// Three slots tolerate up to two frames of CPU/GPU overlap before the CPU
/// must stall.
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 3;

/// A fixed-size circular collection of [`FrameSlot`]s.
///
/// The producer cycles through the ring once per frame; each slot carries
/// its own retirement marker so the producer can track each slot's GPU
/// status independently. A fixed ring (rather than an unbounded queue)
/// bounds GPU-side memory consumption and caps how far the CPU can run
/// ahead of the GPU.
///
/// # Thread Safety
///
/// `FrameRing` is **not** internally synchronized; it is owned by the single
/// producer thread.
pub struct FrameRing {
    slots: Vec<FrameSlot>,
    current: usize,
}

impl FrameRing {
    /// Build `count` slots eagerly.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is zero or slot allocation fails.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        count: usize,
        capacities: &FrameCapacities,
    ) -> Result<Self, GraphicsError> {
        if count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "frame ring must have at least one slot".to_string(),
            ));
        }

        let slots = (0..count)
            .map(|i| FrameSlot::new(device, capacities, i))
            .collect::<Result<Vec<_>, _>>()?;

        log::trace!("FrameRing: created {count} slots");

        Ok(Self {
            slots,
            // Advances before use, so the first frame lands on slot 0.
            current: count - 1,
        })
    }

    /// Advance round-robin and return the now-current slot.
    pub fn next(&mut self) -> &mut FrameSlot {
        self.current = (self.current + 1) % self.slots.len();
        &mut self.slots[self.current]
    }

    /// The current slot.
    pub fn current(&self) -> &FrameSlot {
        &self.slots[self.current]
    }

    /// The current slot, writable.
    pub fn current_mut(&mut self) -> &mut FrameSlot {
        &mut self.slots[self.current]
    }

    /// Index of the current slot.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of slots in the ring.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the ring has no slots (never true for a constructed ring).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, in ring order.
    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }
}

impl std::fmt::Debug for FrameRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRing")
            .field("len", &self.slots.len())
            .field("current", &self.current)
            .finish()
    }
}
