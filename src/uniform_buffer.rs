//! # Uniform Buffer
//!
//! This module defines the `UniformBuffer` struct, the per-frame block of data every demo
//! program reads from `@group(0) @binding(0)`. It mirrors the `Uniforms` struct of the WGSL
//! prelude field for field.
//!
//! ## Overview
//!
//! - **Transforms**: the model matrix, its inverse (the ray caster works in object space) and
//!   the combined view-projection matrix.
//! - **Camera and light**: the world-space eye position and the light direction.
//! - **Volume parameters**: voxel counts, ray step count, opacity scale and threshold.
//!
//! ### Memory Layout and Traits
//!
//! - `#[repr(C)]` keeps the field order the shader expects.
//! - Every field is a `Mat4` or a `Vec4`, so there is no padding to account for under the
//!   WGSL uniform layout rules; the struct is 256 bytes.
//! - `bytemuck::Pod` and `bytemuck::Zeroable` allow uploading it with `bytemuck::cast_slice`.

#[repr(C)]
#[derive(Default, Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBuffer {
    /// Object-to-world transform.
    pub model: nalgebra_glm::Mat4,

    /// Inverse of `model`.
    pub model_inv: nalgebra_glm::Mat4,

    /// World-to-clip transform.
    pub view_proj: nalgebra_glm::Mat4,

    /// Camera position in world space, `w` unused.
    pub eye: nalgebra_glm::Vec4,

    /// Direction the light travels in world space, `w` unused.
    pub light_dir: nalgebra_glm::Vec4,

    /// Voxel counts in `xyz`, ray steps across the cube diagonal in `w`.
    pub volume_dims: nalgebra_glm::Vec4,

    /// `x`: opacity scale, `y`: threshold, `z`: elapsed seconds.
    pub params: nalgebra_glm::Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_shader_block_size() {
        assert_eq!(std::mem::size_of::<UniformBuffer>(), 256);
        assert_eq!(std::mem::align_of::<UniformBuffer>() % 4, 0);
    }
}
