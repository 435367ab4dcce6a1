//! # Vertex Module
//!
//! This module provides the `Vertex` struct and the buffer layout the GPU uses to read it.
//! Every demo draws the same vertex format: an object-space position, a normal, a texture
//! coordinate and an RGBA color. Demos that do not need a given attribute simply ignore it in
//! their shader, which keeps one pipeline layout and one mesh type for the whole crate.
//!
//! # Overview
//!
//! - [`Vertex`]: one vertex, laid out `#[repr(C)]` so it can be cast to bytes with `bytemuck`.
//! - [`Vertex::vertex_attributes`]: the shader locations of each attribute.
//! - [`Vertex::description`]: the buffer layout handed to the render pipeline.
//!
//! ```ignore
//! let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
//!     label: Some("Vertex Buffer"),
//!     contents: bytemuck::cast_slice(&mesh.vertices),
//!     usage: wgpu::BufferUsages::VERTEX,
//! });
//! ```
//!
//! The attribute locations must match the `VertexInput` struct of the shader prelude:
//!
//! | location | attribute   | format      |
//! |----------|-------------|-------------|
//! | 0        | `position`  | `Float32x3` |
//! | 1        | `normal`    | `Float32x3` |
//! | 2        | `tex_coords`| `Float32x2` |
//! | 3        | `color`     | `Float32x4` |

/// A single vertex of a demo mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],

    /// Object-space normal, unit length for lit geometry.
    pub normal: [f32; 3],

    /// Texture coordinate, `0..=1` across each face of the built-in cube.
    pub tex_coords: [f32; 2],

    /// Straight (non-premultiplied) RGBA color.
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(
        position: [f32; 3],
        normal: [f32; 3],
        tex_coords: [f32; 2],
        color: [f32; 4],
    ) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            color,
        }
    }

    /// Returns the attributes of a vertex, one per shader location.
    pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
        wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x4
        ]
        .to_vec()
    }

    /// Describes how a vertex buffer of `Vertex` values is laid out in memory.
    pub fn description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_packed_back_to_back() {
        let attributes = Vertex::vertex_attributes();
        let offsets: Vec<_> = attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32]);
        assert_eq!(std::mem::size_of::<Vertex>(), 48);

        let layout = Vertex::description(&attributes);
        assert_eq!(layout.array_stride, 48);
    }
}
