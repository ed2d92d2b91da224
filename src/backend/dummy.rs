//! Dummy GPU backend for testing and development.
//!
//! This backend performs no actual GPU work but keeps the contracts real:
//! buffers are host allocations so mapped writes round-trip byte-for-byte,
//! and timelines are condvar-backed completion counters so blocking waits
//! behave like waits on a device fence.
//!
//! By default every enqueued signal completes immediately, mirroring a GPU
//! that is never behind. [`DummyBackend::with_manual_completion`] disables
//! that: signals are only "enqueued", and the device-side counter advances
//! when [`DummyBackend::complete_up_to`] is called. Tests use this to
//! simulate a GPU lagging an arbitrary number of submissions behind the CPU.

use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::GraphicsError;
use crate::types::{align_up, BufferDescriptor, CONSTANT_BUFFER_ALIGNMENT};

use super::{GpuBuffer, GpuCommandContext, GpuTimeline};

/// Base of the fake GPU virtual address space handed out for buffers.
const DEVICE_ADDRESS_BASE: u64 = 0x0001_0000_0000;

#[derive(Debug, Default)]
pub(crate) struct TimelineState {
    completed: u64,
    lost: bool,
}

/// Shared state behind a dummy timeline handle.
///
/// The condvar is the waitable completion primitive: waiters block on it and
/// are woken whenever the completed value advances or the device is lost.
pub struct TimelineShared {
    state: Mutex<TimelineState>,
    retired: Condvar,
}

impl TimelineShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(TimelineState::default()),
            retired: Condvar::new(),
        }
    }

    pub(crate) fn completed(&self) -> u64 {
        self.state.lock().completed
    }
}

/// Dummy GPU backend.
#[derive(Debug)]
pub struct DummyBackend {
    /// Whether enqueued signals complete immediately.
    auto_complete: bool,
    /// Set once the simulated device is lost; never cleared.
    lost: AtomicBool,
    /// Cursor into the fake device address space.
    address_cursor: AtomicU64,
}

impl DummyBackend {
    /// Create a new dummy backend. Signals complete as soon as they are
    /// enqueued, so the simulated GPU never falls behind the CPU.
    pub fn new() -> Self {
        Self {
            auto_complete: true,
            lost: AtomicBool::new(false),
            address_cursor: AtomicU64::new(0),
        }
    }

    /// Create a dummy backend whose timelines only advance through
    /// [`complete_up_to`](Self::complete_up_to).
    pub fn with_manual_completion() -> Self {
        Self {
            auto_complete: false,
            ..Self::new()
        }
    }

    /// Advance a timeline's device-side counter to `value`, waking any
    /// blocked waiters. The counter never moves backwards.
    pub fn complete_up_to(&self, timeline: &GpuTimeline, value: u64) {
        match timeline {
            GpuTimeline::Dummy { shared } => {
                let mut state = shared.state.lock();
                if value > state.completed {
                    log::trace!(
                        "DummyBackend: timeline completed {} -> {}",
                        state.completed,
                        value
                    );
                    state.completed = value;
                    shared.retired.notify_all();
                }
            }
        }
    }

    /// Simulate device loss: every call on this backend starts failing with
    /// [`GraphicsError::DeviceLost`], and waiters blocked on the timeline
    /// are woken with that error.
    pub fn simulate_device_loss(&self, timeline: &GpuTimeline) {
        self.lost.store(true, Ordering::Release);
        match timeline {
            GpuTimeline::Dummy { shared } => {
                let mut state = shared.state.lock();
                state.lost = true;
                shared.retired.notify_all();
            }
        }
    }

    fn check_lost(&self) -> Result<(), GraphicsError> {
        if self.lost.load(Ordering::Acquire) {
            Err(GraphicsError::DeviceLost)
        } else {
            Ok(())
        }
    }
}

impl Default for DummyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl super::GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        self.check_lost()?;

        let size = descriptor.size as usize;
        let memory: Box<[UnsafeCell<u8>]> = (0..size).map(|_| UnsafeCell::new(0)).collect();

        // Hand out distinct, constant-buffer-aligned fake addresses.
        let span = align_up(descriptor.size, CONSTANT_BUFFER_ALIGNMENT);
        let offset = self.address_cursor.fetch_add(span, Ordering::Relaxed);
        let device_address = DEVICE_ADDRESS_BASE + offset;

        log::trace!(
            "DummyBackend: created buffer {:?} (size: {}, address: {:#x})",
            descriptor.label,
            descriptor.size,
            device_address
        );

        Ok(GpuBuffer::Dummy {
            memory,
            device_address,
            mapped: AtomicBool::new(false),
        })
    }

    fn map_buffer(&self, buffer: &GpuBuffer) -> Result<NonNull<u8>, GraphicsError> {
        self.check_lost()?;
        match buffer {
            GpuBuffer::Dummy { memory, mapped, .. } => {
                if mapped.swap(true, Ordering::AcqRel) {
                    return Err(GraphicsError::MappingFailed(
                        "buffer is already mapped".to_string(),
                    ));
                }
                NonNull::new(memory.as_ptr() as *mut u8).ok_or_else(|| {
                    GraphicsError::MappingFailed("buffer has no backing memory".to_string())
                })
            }
        }
    }

    fn unmap_buffer(&self, buffer: &GpuBuffer) {
        match buffer {
            GpuBuffer::Dummy { mapped, .. } => {
                mapped.store(false, Ordering::Release);
            }
        }
    }

    fn buffer_device_address(&self, buffer: &GpuBuffer) -> u64 {
        match buffer {
            GpuBuffer::Dummy { device_address, .. } => *device_address,
        }
    }

    fn create_command_context(&self) -> Result<GpuCommandContext, GraphicsError> {
        self.check_lost()?;
        Ok(GpuCommandContext::Dummy {
            reset_count: AtomicU64::new(0),
        })
    }

    fn reset_command_context(&self, context: &GpuCommandContext) -> Result<(), GraphicsError> {
        self.check_lost()?;
        match context {
            GpuCommandContext::Dummy { reset_count } => {
                reset_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    fn submit_context(&self, context: &GpuCommandContext) -> Result<(), GraphicsError> {
        self.check_lost()?;
        log::trace!("DummyBackend: submitted {:?}", context);
        Ok(())
    }

    fn create_timeline(&self) -> Result<GpuTimeline, GraphicsError> {
        self.check_lost()?;
        Ok(GpuTimeline::Dummy {
            shared: Arc::new(TimelineShared::new()),
        })
    }

    fn signal_timeline(&self, timeline: &GpuTimeline, value: u64) -> Result<(), GraphicsError> {
        self.check_lost()?;
        log::trace!("DummyBackend: enqueued signal {}", value);
        if self.auto_complete {
            self.complete_up_to(timeline, value);
        }
        Ok(())
    }

    fn timeline_value(&self, timeline: &GpuTimeline) -> Result<u64, GraphicsError> {
        self.check_lost()?;
        match timeline {
            GpuTimeline::Dummy { shared } => {
                let state = shared.state.lock();
                if state.lost {
                    Err(GraphicsError::DeviceLost)
                } else {
                    Ok(state.completed)
                }
            }
        }
    }

    fn wait_timeline(
        &self,
        timeline: &GpuTimeline,
        value: u64,
        timeout: Option<Duration>,
    ) -> Result<bool, GraphicsError> {
        self.check_lost()?;
        let deadline = timeout.map(|t| Instant::now() + t);
        match timeline {
            GpuTimeline::Dummy { shared } => {
                let mut state = shared.state.lock();
                loop {
                    if state.lost {
                        return Err(GraphicsError::DeviceLost);
                    }
                    if state.completed >= value {
                        return Ok(true);
                    }
                    match deadline {
                        Some(deadline) => {
                            if shared.retired.wait_until(&mut state, deadline).timed_out() {
                                if state.lost {
                                    return Err(GraphicsError::DeviceLost);
                                }
                                return Ok(state.completed >= value);
                            }
                        }
                        None => shared.retired.wait(&mut state),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GpuBackend;
    use crate::types::BufferUsage;

    fn test_descriptor(size: u64) -> BufferDescriptor {
        BufferDescriptor::new(size, BufferUsage::UNIFORM | BufferUsage::MAP_WRITE)
    }

    #[test]
    fn test_buffer_addresses_are_distinct_and_aligned() {
        let backend = DummyBackend::new();
        let a = backend.create_buffer(&test_descriptor(100)).unwrap();
        let b = backend.create_buffer(&test_descriptor(100)).unwrap();

        let addr_a = backend.buffer_device_address(&a);
        let addr_b = backend.buffer_device_address(&b);
        assert_ne!(addr_a, addr_b);
        assert_eq!(addr_a % CONSTANT_BUFFER_ALIGNMENT, 0);
        assert_eq!(addr_b % CONSTANT_BUFFER_ALIGNMENT, 0);
    }

    #[test]
    fn test_double_map_fails() {
        let backend = DummyBackend::new();
        let buffer = backend.create_buffer(&test_descriptor(64)).unwrap();

        backend.map_buffer(&buffer).unwrap();
        assert!(backend.map_buffer(&buffer).is_err());

        backend.unmap_buffer(&buffer);
        assert!(backend.map_buffer(&buffer).is_ok());
    }

    #[test]
    fn test_auto_complete_signals() {
        let backend = DummyBackend::new();
        let timeline = backend.create_timeline().unwrap();

        backend.signal_timeline(&timeline, 3).unwrap();
        assert_eq!(backend.timeline_value(&timeline).unwrap(), 3);
        assert!(backend.wait_timeline(&timeline, 3, None).unwrap());
    }

    #[test]
    fn test_manual_completion() {
        let backend = DummyBackend::with_manual_completion();
        let timeline = backend.create_timeline().unwrap();

        backend.signal_timeline(&timeline, 2).unwrap();
        assert_eq!(backend.timeline_value(&timeline).unwrap(), 0);

        // Wait times out while the device-side counter lags.
        let retired = backend
            .wait_timeline(&timeline, 1, Some(Duration::from_millis(10)))
            .unwrap();
        assert!(!retired);

        backend.complete_up_to(&timeline, 2);
        assert_eq!(backend.timeline_value(&timeline).unwrap(), 2);
        assert!(backend.wait_timeline(&timeline, 2, None).unwrap());
    }

    #[test]
    fn test_completed_value_never_regresses() {
        let backend = DummyBackend::with_manual_completion();
        let timeline = backend.create_timeline().unwrap();

        backend.complete_up_to(&timeline, 5);
        backend.complete_up_to(&timeline, 3);
        assert_eq!(backend.timeline_value(&timeline).unwrap(), 5);
    }

    #[test]
    fn test_wait_wakes_on_completion_from_other_thread() {
        let backend = Arc::new(DummyBackend::with_manual_completion());
        let timeline = backend.create_timeline().unwrap();

        let waker_backend = Arc::clone(&backend);
        let waker_timeline = timeline.clone();
        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            waker_backend.complete_up_to(&waker_timeline, 1);
        });

        assert!(backend.wait_timeline(&timeline, 1, None).unwrap());
        waker.join().unwrap();
    }

    #[test]
    fn test_device_loss_fails_waits() {
        let backend = DummyBackend::with_manual_completion();
        let timeline = backend.create_timeline().unwrap();

        backend.simulate_device_loss(&timeline);
        assert_eq!(
            backend.wait_timeline(&timeline, 1, None),
            Err(GraphicsError::DeviceLost)
        );
        assert_eq!(
            backend.timeline_value(&timeline),
            Err(GraphicsError::DeviceLost)
        );
        assert!(matches!(
            backend.create_buffer(&test_descriptor(64)),
            Err(GraphicsError::DeviceLost)
        ));
    }
}
