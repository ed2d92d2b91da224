//! GPU-layout constant blocks.
//!
//! These structs are the wire format for per-pass, per-object, and
//! per-material constant data. They are `#[repr(C)]` with explicit padding so
//! their in-memory layout matches what shaders read; all of them are
//! [`bytemuck::Pod`] so they can be copied into mapped upload memory as raw
//! bytes.

use bytemuck::{Pod, Zeroable};

/// A 4x4 matrix in GPU layout.
pub type Mat4 = [[f32; 4]; 4];

/// The identity matrix.
pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Maximum number of lights in a pass constant block.
pub const MAX_LIGHTS: usize = 16;

/// One light's parameters, shared by directional/point/spot lights.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightConstants {
    /// Light color/intensity.
    pub strength: [f32; 3],
    /// Point/spot only: distance at which falloff begins.
    pub falloff_start: f32,
    /// Directional/spot only.
    pub direction: [f32; 3],
    /// Point/spot only: distance at which the light reaches zero.
    pub falloff_end: f32,
    /// Point/spot only.
    pub position: [f32; 3],
    /// Spot only: exponent sharpening the cone.
    pub spot_power: f32,
}

impl Default for LightConstants {
    fn default() -> Self {
        Self {
            strength: [0.5, 0.5, 0.5],
            falloff_start: 1.0,
            direction: [0.0, -1.0, 0.0],
            falloff_end: 10.0,
            position: [0.0, 0.0, 0.0],
            spot_power: 64.0,
        }
    }
}

/// Per-pass constants: camera matrices, viewport, timing, lighting
/// environment. Rewritten into the current frame slot every frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    pub view: Mat4,
    pub inv_view: Mat4,
    pub proj: Mat4,
    pub inv_proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
    pub eye_pos: [f32; 3],
    pub _pad0: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient_light: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_start: f32,
    pub fog_range: f32,
    pub _pad1: [f32; 2],
    pub lights: [LightConstants; MAX_LIGHTS],
}

impl Default for PassConstants {
    fn default() -> Self {
        Self {
            view: MAT4_IDENTITY,
            inv_view: MAT4_IDENTITY,
            proj: MAT4_IDENTITY,
            inv_proj: MAT4_IDENTITY,
            view_proj: MAT4_IDENTITY,
            inv_view_proj: MAT4_IDENTITY,
            eye_pos: [0.0; 3],
            _pad0: 0.0,
            render_target_size: [0.0; 2],
            inv_render_target_size: [0.0; 2],
            near_z: 0.0,
            far_z: 0.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient_light: [0.0, 0.0, 0.0, 1.0],
            fog_color: [0.7, 0.7, 0.7, 1.0],
            fog_start: 5.0,
            fog_range: 150.0,
            _pad1: [0.0; 2],
            lights: [LightConstants::default(); MAX_LIGHTS],
        }
    }
}

/// Per-object constants: object-to-world and texture transforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: Mat4,
    pub tex_transform: Mat4,
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self {
            world: MAT4_IDENTITY,
            tex_transform: MAT4_IDENTITY,
        }
    }
}

/// Per-material constants for the lighting model.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub diffuse_albedo: [f32; 4],
    pub fresnel_r0: [f32; 3],
    pub roughness: f32,
    pub transform: Mat4,
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse_albedo: [1.0, 1.0, 1.0, 1.0],
            fresnel_r0: [0.01, 0.01, 0.01],
            roughness: 0.25,
            transform: MAT4_IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::element_stride;

    #[test]
    fn test_constant_block_sizes() {
        assert_eq!(std::mem::size_of::<LightConstants>(), 48);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 128);
        assert_eq!(std::mem::size_of::<MaterialConstants>(), 96);
        // No implicit padding anywhere: everything is 4-byte aligned.
        assert_eq!(std::mem::align_of::<PassConstants>(), 4);
    }

    #[test]
    fn test_constant_block_strides() {
        assert_eq!(
            element_stride(std::mem::size_of::<ObjectConstants>() as u64, true),
            256
        );
        assert_eq!(
            element_stride(std::mem::size_of::<MaterialConstants>() as u64, true),
            256
        );
    }

    #[test]
    fn test_identity_default() {
        let object = ObjectConstants::default();
        assert_eq!(object.world, MAT4_IDENTITY);
        assert_eq!(object.tex_transform, MAT4_IDENTITY);
    }
}
