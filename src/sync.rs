//! CPU-GPU submission pacing.
//!
//! This module provides [`SubmissionPacer`], which translates "this frame's
//! commands are submitted" into a waitable completion signal.
//!
//! The pacer owns a timeline object whose device-side counter the GPU
//! advances as submitted work finishes. After each submission the pacer
//! enqueues a signal carrying the next value of a strictly increasing
//! marker; because signals execute in queue order, marker `n` retiring means
//! every command submitted before it has finished. The CPU can then ask
//! "has marker `n` retired yet?" without blocking, or block until it has.
//!
//! Blocking happens in exactly one place, [`wait_until_retired`], which is
//! the system's sole suspension point. A timeout variant exists so callers
//! can detect a hung device instead of waiting forever.
//!
//! [`wait_until_retired`]: SubmissionPacer::wait_until_retired

use std::sync::Arc;
use std::time::Duration;

use crate::backend::GpuTimeline;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;

/// Issues retirement markers for submitted work and waits on their
/// completion.
///
/// One pacer is shared across all frame slots; each slot records the marker
/// value that, once retired, means its resources are free to reuse.
///
/// # Invariants
///
/// - Issued marker values are strictly increasing, starting at 1
///   (0 means "never submitted").
/// - The device-side completed value is non-decreasing and never exceeds
///   the last issued marker.
pub struct SubmissionPacer {
    device: Arc<GraphicsDevice>,
    timeline: GpuTimeline,
    last_issued: u64,
}

impl SubmissionPacer {
    /// Create a pacer over a fresh timeline
    /// (called by [`GraphicsDevice::create_submission_pacer`]).
    pub(crate) fn new(device: &Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        let timeline = device.backend().create_timeline()?;
        Ok(Self {
            device: Arc::clone(device),
            timeline,
            last_issued: 0,
        })
    }

    /// The timeline handle backing this pacer.
    ///
    /// Clones of the handle share the completion counter, which lets other
    /// threads (or tests driving the dummy backend) observe and advance it.
    pub fn timeline(&self) -> &GpuTimeline {
        &self.timeline
    }

    /// The most recently issued marker value (0 if none yet).
    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    /// The device-side completed marker value.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the device is lost.
    pub fn completed(&self) -> Result<u64, GraphicsError> {
        self.device.backend().timeline_value(&self.timeline)
    }

    /// Issue the next marker and enqueue its completion signal behind all
    /// previously-submitted work on the queue.
    ///
    /// Returns the new marker value; the caller stamps it on the frame slot
    /// whose commands were just submitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal cannot be enqueued. A failed
    /// submission poisons subsequent frames' correctness, so callers should
    /// shut down the frame loop rather than continue.
    pub fn signal_after_submission(&mut self) -> Result<u64, GraphicsError> {
        self.last_issued += 1;
        self.device
            .backend()
            .signal_timeline(&self.timeline, self.last_issued)?;
        log::trace!("SubmissionPacer: issued marker {}", self.last_issued);
        Ok(self.last_issued)
    }

    /// Check whether `marker` has retired (non-blocking).
    ///
    /// Marker 0 ("never submitted") is trivially retired.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the device is lost.
    pub fn is_retired(&self, marker: u64) -> Result<bool, GraphicsError> {
        Ok(marker <= self.completed()?)
    }

    /// Block the calling thread until `marker` retires.
    ///
    /// Returns immediately if it already has. This wait blocks only the
    /// caller, never the GPU queue.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the device enters a state
    /// where the wait can never complete.
    pub fn wait_until_retired(&self, marker: u64) -> Result<(), GraphicsError> {
        self.device
            .backend()
            .wait_timeline(&self.timeline, marker, None)?;
        Ok(())
    }

    /// Block until `marker` retires or `timeout` elapses.
    ///
    /// Returns `true` if the marker retired, `false` on timeout. Use this to
    /// detect a hung or lost device instead of blocking forever.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::DeviceLost`] if the device is lost.
    pub fn wait_until_retired_timeout(
        &self,
        marker: u64,
        timeout: Duration,
    ) -> Result<bool, GraphicsError> {
        self.device
            .backend()
            .wait_timeline(&self.timeline, marker, Some(timeout))
    }

    /// Drain the queue entirely: issue a marker behind everything submitted
    /// so far and wait for it to retire.
    ///
    /// Required wherever in-flight work must not outlive a resource change:
    /// after initial resource uploads, around swap-surface reconfiguration,
    /// and at teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal fails or the device is lost.
    pub fn flush(&mut self) -> Result<(), GraphicsError> {
        let marker = self.signal_after_submission()?;
        log::trace!("SubmissionPacer: flushing queue up to marker {marker}");
        self.wait_until_retired(marker)
    }
}

impl std::fmt::Debug for SubmissionPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPacer")
            .field("last_issued", &self.last_issued)
            .field("timeline", &self.timeline)
            .finish()
    }
}

// Ensure SubmissionPacer is Send + Sync
static_assertions::assert_impl_all!(SubmissionPacer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::instance::GraphicsInstance;

    fn pacer_with_backend(backend: Arc<DummyBackend>) -> (Arc<DummyBackend>, SubmissionPacer) {
        let instance = GraphicsInstance::with_backend(backend.clone());
        let device = instance.create_device().unwrap();
        let pacer = device.create_submission_pacer().unwrap();
        (backend, pacer)
    }

    fn auto_pacer() -> SubmissionPacer {
        pacer_with_backend(Arc::new(DummyBackend::new())).1
    }

    #[test]
    fn test_markers_strictly_increase() {
        let mut pacer = auto_pacer();
        assert_eq!(pacer.last_issued(), 0);

        let mut previous = 0;
        for _ in 0..5 {
            let marker = pacer.signal_after_submission().unwrap();
            assert!(marker > previous);
            previous = marker;
        }
        assert_eq!(pacer.last_issued(), 5);
    }

    #[test]
    fn test_marker_zero_is_always_retired() {
        let pacer = auto_pacer();
        assert!(pacer.is_retired(0).unwrap());
    }

    #[test]
    fn test_unissued_marker_not_retired() {
        let (_backend, pacer) =
            pacer_with_backend(Arc::new(DummyBackend::with_manual_completion()));
        assert!(!pacer.is_retired(1).unwrap());
    }

    #[test]
    fn test_completed_tracks_device_counter() {
        let (backend, mut pacer) =
            pacer_with_backend(Arc::new(DummyBackend::with_manual_completion()));

        pacer.signal_after_submission().unwrap();
        pacer.signal_after_submission().unwrap();
        assert_eq!(pacer.completed().unwrap(), 0);
        assert!(!pacer.is_retired(1).unwrap());

        backend.complete_up_to(pacer.timeline(), 1);
        assert!(pacer.is_retired(1).unwrap());
        assert!(!pacer.is_retired(2).unwrap());
    }

    #[test]
    fn test_wait_returns_immediately_when_retired() {
        let mut pacer = auto_pacer();
        let marker = pacer.signal_after_submission().unwrap();
        pacer.wait_until_retired(marker).unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let (_backend, mut pacer) =
            pacer_with_backend(Arc::new(DummyBackend::with_manual_completion()));
        let marker = pacer.signal_after_submission().unwrap();

        let retired = pacer
            .wait_until_retired_timeout(marker, Duration::from_millis(10))
            .unwrap();
        assert!(!retired);
    }

    #[test]
    fn test_flush_drains_queue() {
        let mut pacer = auto_pacer();
        pacer.signal_after_submission().unwrap();
        pacer.flush().unwrap();
        assert!(pacer.is_retired(pacer.last_issued()).unwrap());
    }

    #[test]
    fn test_device_loss_fails_wait() {
        let (backend, mut pacer) =
            pacer_with_backend(Arc::new(DummyBackend::with_manual_completion()));
        let marker = pacer.signal_after_submission().unwrap();

        backend.simulate_device_loss(pacer.timeline());
        assert_eq!(
            pacer.wait_until_retired(marker),
            Err(GraphicsError::DeviceLost)
        );
        assert_eq!(pacer.is_retired(marker), Err(GraphicsError::DeviceLost));
    }
}
