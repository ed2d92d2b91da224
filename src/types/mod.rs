//! Common types and descriptors for graphics resources.
//!
//! This module contains usage flags, descriptor structs, alignment helpers,
//! and the GPU-layout constant blocks streamed to the GPU each frame.

mod buffer;
mod constants;

pub use buffer::{
    align_up, element_stride, BufferDescriptor, BufferUsage, CONSTANT_BUFFER_ALIGNMENT,
};
pub use constants::{
    LightConstants, Mat4, MaterialConstants, ObjectConstants, PassConstants, MAT4_IDENTITY,
    MAX_LIGHTS,
};
