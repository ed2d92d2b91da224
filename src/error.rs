//! Graphics error types.

use thiserror::Error;

/// Errors that can occur in the frame synchronization core.
///
/// Allocation and device failures are not retried; they propagate to the
/// caller and are generally fatal to startup or to the frame loop.
/// [`DeviceLost`](GraphicsError::DeviceLost) is unrecoverable: every
/// outstanding wait fails permanently and the only valid response is a full
/// teardown (and optionally device re-creation from scratch).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// GPU-visible memory allocation failed.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),
    /// Mapping an allocation for CPU access failed.
    #[error("mapping failed: {0}")]
    MappingFailed(String),
    /// A device-level call failed.
    #[error("device error: {0}")]
    Device(String),
    /// The GPU device entered an unrecoverable state.
    #[error("GPU device lost")]
    DeviceLost,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
