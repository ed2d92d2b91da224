//! Application-variant seam over the frame producer.
//!
//! Concrete applications (different demos, different rendering techniques)
//! implement [`FrameApp`] and are driven by [`run_frames`]; the frame
//! synchronization machinery stays independent of which variant is active.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::frame::FrameProducer;

/// A frame-producing application variant.
pub trait FrameApp {
    /// One-time setup: create meshes, materials, and initial scene state.
    ///
    /// Implementations that upload static resources should
    /// [`flush`](FrameProducer::flush) before the first frame so nothing
    /// in flight references staging memory.
    fn configure(&mut self, device: &Arc<GraphicsDevice>) -> Result<(), GraphicsError>;

    /// Produce one frame: run the begin/populate/record/submit cycle on the
    /// producer.
    fn produce_frame(&mut self, producer: &mut FrameProducer) -> Result<(), GraphicsError>;

    /// React to a surface size change.
    ///
    /// The default drains the queue so no in-flight frame references the
    /// surfaces about to be replaced.
    fn handle_resize(
        &mut self,
        producer: &mut FrameProducer,
        _width: u32,
        _height: u32,
    ) -> Result<(), GraphicsError> {
        producer.flush()
    }
}

/// Drive an application for `frames` frames, then drain.
///
/// On any failure the pipeline is drained (best effort) and the error is
/// reported and returned; continuing to produce frames after a failed
/// submission cannot be done correctly.
pub fn run_frames(
    app: &mut dyn FrameApp,
    producer: &mut FrameProducer,
    frames: u64,
) -> Result<(), GraphicsError> {
    for _ in 0..frames {
        if let Err(err) = app.produce_frame(producer) {
            log::error!("frame production failed: {err}; draining and shutting down");
            let _ = producer.drain();
            return Err(err);
        }
    }
    producer.drain()
}
