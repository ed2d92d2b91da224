//! Common utilities for frame pipeline integration tests.

use std::sync::Arc;

use framepace::{
    DummyBackend, FrameCapacities, FrameProducer, GraphicsDevice, GraphicsInstance, Mat4,
    SceneState, MAT4_IDENTITY,
};

/// Capacities used across the integration tests: two passes (e.g. main +
/// mirrored), a handful of objects and materials.
pub fn test_capacities() -> FrameCapacities {
    FrameCapacities::new(2, 8, 4)
}

/// A translation matrix; distinct values make readback checks unambiguous.
pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    let mut m = MAT4_IDENTITY;
    m[3] = [x, y, z, 1.0];
    m
}

/// Test context providing a device over a controllable dummy backend.
///
/// Keeps the concrete backend handle so tests can drive timeline completion
/// and device-loss simulation directly.
pub struct TestContext {
    /// The dummy backend, for manual completion control.
    pub backend: Arc<DummyBackend>,
    /// Graphics instance (kept alive for the device).
    #[allow(dead_code)]
    pub instance: Arc<GraphicsInstance>,
    /// Graphics device for creating resources.
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    /// Context whose simulated GPU completes every signal immediately.
    pub fn auto() -> Self {
        Self::with_backend(Arc::new(DummyBackend::new()))
    }

    /// Context whose simulated GPU only advances via
    /// [`DummyBackend::complete_up_to`].
    pub fn manual() -> Self {
        Self::with_backend(Arc::new(DummyBackend::with_manual_completion()))
    }

    fn with_backend(backend: Arc<DummyBackend>) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let instance = GraphicsInstance::with_backend(backend.clone());
        let device = instance.create_device().expect("Failed to create device");
        Self {
            backend,
            instance,
            device,
        }
    }

    /// Create a frame producer with the shared test capacities.
    pub fn producer(&self, frames_in_flight: usize) -> FrameProducer {
        self.device
            .create_frame_producer(frames_in_flight, &test_capacities())
            .expect("Failed to create frame producer")
    }

    /// Create a scene with one pass and `items` identity items.
    pub fn scene(&self, frames_in_flight: usize, items: usize) -> SceneState {
        let mut scene = SceneState::new(frames_in_flight);
        scene.push_pass(Default::default());
        for _ in 0..items {
            scene.add_identity_item();
        }
        scene
    }
}
