//! The per-frame production cycle.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::frame::{FrameCapacities, FrameRing, FrameSlot};
use crate::scene::SceneState;
use crate::sync::SubmissionPacer;

/// Orchestrates the per-frame cycle over a [`FrameRing`] and a
/// [`SubmissionPacer`].
///
/// Each frame runs:
///
/// 1. [`begin_frame`](Self::begin_frame) - advance to the next slot and, if
///    its previous marker has not retired, block until it has. This is the
///    only point the producer thread stalls.
/// 2. [`populate`](Self::populate) - copy dirty scene values into the
///    slot's upload regions.
/// 3. External command recording against
///    [`current_slot`](Self::current_slot) (out of this crate's scope).
/// 4. [`submit_and_advance`](Self::submit_and_advance) - submit the slot's
///    commands, issue a new marker, and stamp it on the slot.
///
/// At shutdown, [`drain`](Self::drain) waits out every slot's outstanding
/// marker so resources can be destroyed safely; dropping the producer
/// drains implicitly.
///
/// Misuse of the cycle (beginning a frame twice, submitting without a frame
/// open) is a programming error and panics.
pub struct FrameProducer {
    device: Arc<GraphicsDevice>,
    ring: FrameRing,
    pacer: SubmissionPacer,
    frame_open: bool,
    frame_count: u64,
    stall_count: u64,
}

impl FrameProducer {
    /// Create a producer with `frames_in_flight` slots
    /// (called by [`GraphicsDevice::create_frame_producer`]).
    pub(crate) fn new(
        device: &Arc<GraphicsDevice>,
        frames_in_flight: usize,
        capacities: &FrameCapacities,
    ) -> Result<Self, GraphicsError> {
        let ring = FrameRing::new(device, frames_in_flight, capacities)?;
        let pacer = SubmissionPacer::new(device)?;

        Ok(Self {
            device: Arc::clone(device),
            ring,
            pacer,
            frame_open: false,
            frame_count: 0,
            stall_count: 0,
        })
    }

    /// Begin a new frame.
    ///
    /// Advances the ring to the next slot. If that slot's previous marker
    /// has not yet retired, blocks until it does - this is the backpressure
    /// stall that keeps the CPU at most `frames_in_flight - 1` frames ahead
    /// of the GPU. Once the slot is free its command context is reset for
    /// reuse.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails (device lost) or the context
    /// cannot be reset.
    pub fn begin_frame(&mut self) -> Result<(), GraphicsError> {
        assert!(!self.frame_open, "begin_frame called with a frame already open");

        let marker = self.ring.next().retire_marker();
        if marker != 0 && !self.pacer.is_retired(marker)? {
            log::trace!(
                "FrameProducer: stalling on slot {} (marker {})",
                self.ring.current_index(),
                marker
            );
            self.stall_count += 1;
            self.pacer.wait_until_retired(marker)?;
        }

        // Safe to recycle now that the slot's previous work has retired.
        self.ring.current().command_context().reset()?;

        self.frame_open = true;
        self.frame_count += 1;

        log::trace!(
            "FrameProducer: begin frame {} (slot {})",
            self.frame_count,
            self.ring.current_index()
        );

        Ok(())
    }

    /// Copy current scene values into the open frame's upload regions.
    ///
    /// Pass constants are rewritten every frame. Objects and materials are
    /// copied only while their dirty counter is above zero; the counter is
    /// decremented per copy, so a changed value reaches each of the K slots
    /// exactly once and no redundant copies happen after that.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn populate(&mut self, scene: &mut SceneState) {
        assert!(self.frame_open, "populate called without an open frame");

        let slot = self.ring.current_mut();

        for (index, pass) in scene.passes().iter().enumerate() {
            slot.pass_constants_mut().write(index as u32, pass);
        }

        for item in scene.items_mut() {
            if item.frames_dirty() > 0 {
                slot.object_constants_mut()
                    .write(item.object_index(), &item.object_constants());
                item.mark_copied();
            }
        }

        for material in scene.materials_mut() {
            if material.frames_dirty() > 0 {
                slot.material_constants_mut()
                    .write(material.material_index(), material.constants());
                material.mark_copied();
            }
        }
    }

    /// Submit the open frame's commands and stamp the slot with a fresh
    /// marker.
    ///
    /// Returns the marker value. After this call the slot is in flight and
    /// must not be touched until [`begin_frame`](Self::begin_frame) selects
    /// it again.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    ///
    /// # Errors
    ///
    /// Returns an error if submission or the signal fails. A failed
    /// submission poisons subsequent frames, so callers should drain and
    /// shut down.
    pub fn submit_and_advance(&mut self) -> Result<u64, GraphicsError> {
        assert!(self.frame_open, "submit_and_advance called without an open frame");

        self.device.submit(self.ring.current().command_context())?;
        let marker = self.pacer.signal_after_submission()?;
        self.ring.current_mut().set_retire_marker(marker);
        self.frame_open = false;

        log::trace!(
            "FrameProducer: submitted frame {} (slot {}, marker {})",
            self.frame_count,
            self.ring.current_index(),
            marker
        );

        Ok(marker)
    }

    /// Wait until every slot's outstanding marker has retired.
    ///
    /// Idempotent: a second drain returns immediately. Call before
    /// destroying resources the in-flight frames may still reference.
    ///
    /// # Errors
    ///
    /// Returns an error if a wait fails (device lost).
    pub fn drain(&self) -> Result<(), GraphicsError> {
        for slot in self.ring.slots() {
            let marker = slot.retire_marker();
            if marker != 0 {
                self.pacer.wait_until_retired(marker)?;
            }
        }
        log::trace!("FrameProducer: drained all slots");
        Ok(())
    }

    /// Drain the device queue entirely via the pacer.
    ///
    /// Required after startup resource uploads, around swap-surface
    /// reconfiguration, and at teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal or wait fails.
    pub fn flush(&mut self) -> Result<(), GraphicsError> {
        self.pacer.flush()
    }

    /// The slot belonging to the open frame.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn current_slot(&self) -> &FrameSlot {
        assert!(self.frame_open, "no frame is open");
        self.ring.current()
    }

    /// The slot belonging to the open frame, writable.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn current_slot_mut(&mut self) -> &mut FrameSlot {
        assert!(self.frame_open, "no frame is open");
        self.ring.current_mut()
    }

    /// The frame ring.
    pub fn ring(&self) -> &FrameRing {
        &self.ring
    }

    /// The submission pacer.
    pub fn pacer(&self) -> &SubmissionPacer {
        &self.pacer
    }

    /// The owning device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Number of frames in flight (ring size).
    pub fn frames_in_flight(&self) -> usize {
        self.ring.len()
    }

    /// Total frames begun.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// How many times `begin_frame` had to block on an unretired marker.
    pub fn stall_count(&self) -> u64 {
        self.stall_count
    }

    /// Whether a frame is currently open.
    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        if let Err(err) = self.drain() {
            log::error!("FrameProducer: drain on drop failed: {err}");
        }
    }
}

impl std::fmt::Debug for FrameProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProducer")
            .field("frames_in_flight", &self.ring.len())
            .field("frame_count", &self.frame_count)
            .field("frame_open", &self.frame_open)
            .field("stall_count", &self.stall_count)
            .finish()
    }
}
