//! # Uniform Binding Module
//!
//! This module defines the `UniformBinding` struct, which owns the GPU buffer behind
//! [`UniformBuffer`] together with the bind group that exposes it to the demo programs at
//! `@group(0) @binding(0)`.
//!
//! ## How It Works
//!
//! 1. **Initialization**: [`UniformBinding::new`] allocates a zeroed uniform buffer, a bind
//!    group layout visible to both the vertex and fragment stages, and the bind group itself.
//! 2. **Updating**: [`UniformBinding::update_buffer`] writes a fresh `UniformBuffer` through the
//!    queue once per frame.
//! 3. **Rendering**: the scene sets `bind_group` at index 0 before drawing.
//!
//! ## Stage Visibility
//!
//! The block is read by both stages. The vertex stage needs `model` and `view_proj`; the
//! fragment stages of the volume demos need `model_inv` and `eye` to start rays in object
//! space, `light_dir` for shading and `volume_dims`/`params` for the march.
//!
//! ```ignore
//! let uniform = UniformBinding::new(&device);
//! uniform.update_buffer(&queue, 0, UniformBuffer { model, ..Default::default() });
//! render_pass.set_bind_group(0, &uniform.bind_group, &[]);
//! ```

use crate::uniform_buffer::UniformBuffer;

pub struct UniformBinding {
    /// The GPU buffer holding one `UniformBuffer`.
    pub buffer: wgpu::Buffer,

    pub bind_group: wgpu::BindGroup,

    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl UniformBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Uniform Buffer"),
                contents: bytemuck::cast_slice(&[UniformBuffer::default()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[Self::layout_entry()],
            label: Some("uniform_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// The single layout entry of group 0.
    pub fn layout_entry() -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(
                    std::mem::size_of::<UniformBuffer>() as u64,
                ),
            },
            count: None,
        }
    }

    /// Writes `uniform_buffer` at `offset` bytes into the GPU buffer.
    pub fn update_buffer(
        &self,
        queue: &wgpu::Queue,
        offset: wgpu::BufferAddress,
        uniform_buffer: UniformBuffer,
    ) {
        queue.write_buffer(
            &self.buffer,
            offset,
            bytemuck::cast_slice(&[uniform_buffer]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_is_visible_to_both_stages() {
        let entry = UniformBinding::layout_entry();
        assert!(entry.visibility.contains(wgpu::ShaderStages::FRAGMENT));
        assert!(entry.visibility.contains(wgpu::ShaderStages::VERTEX));
        match entry.ty {
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                min_binding_size,
                ..
            } => assert_eq!(min_binding_size.map(|size| size.get()), Some(256)),
            other => panic!("unexpected binding {other:?}"),
        }
    }
}
