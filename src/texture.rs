//! GPU textures for the volume demos.
//!
//! [`TextureBinding`] uploads a [`Volume`] as a single channel 3-D texture and a [`Colormap`]
//! as an RGBA `width x 1` texture, each with its own linear, edge-clamped sampler, and exposes
//! them at `@group(1)`:
//!
//! | binding | resource                   |
//! |---------|----------------------------|
//! | 0       | volume `texture_3d<f32>`   |
//! | 1       | volume sampler             |
//! | 2       | colormap `texture_2d<f32>` |
//! | 3       | colormap sampler           |
//!
//! Demos that sample neither still bind the group; the pipeline layout is shared.

use crate::colormap::Colormap;
use crate::volume::Volume;

pub struct TextureBinding {
    #[allow(unused)]
    pub volume: wgpu::Texture,

    #[allow(unused)]
    pub colormap: wgpu::Texture,

    pub bind_group: wgpu::BindGroup,

    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl TextureBinding {
    pub fn layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let texture = |binding, view_dimension| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };
        let sampler = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture(0, wgpu::TextureViewDimension::D3),
                sampler(1),
                texture(2, wgpu::TextureViewDimension::D2),
                sampler(3),
            ],
            label: Some("volume_bind_group_layout"),
        })
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        volume: &Volume,
        colormap: &Colormap,
    ) -> Self {
        let [width, height, depth] = volume.dims;
        let volume_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        };
        let volume_texture = upload(
            device,
            queue,
            "Volume Texture",
            volume_size,
            wgpu::TextureDimension::D3,
            wgpu::TextureFormat::R8Unorm,
            &volume.data,
            width,
        );

        let colormap_size = wgpu::Extent3d {
            width: colormap.width(),
            height: 1,
            depth_or_array_layers: 1,
        };
        let colormap_texture = upload(
            device,
            queue,
            "Colormap Texture",
            colormap_size,
            wgpu::TextureDimension::D2,
            // The colormap holds display colors already; no sRGB decode on sampling.
            wgpu::TextureFormat::Rgba8Unorm,
            colormap.as_bytes(),
            4 * colormap.width(),
        );

        let volume_view = volume_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let colormap_view = colormap_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let volume_sampler = clamped_linear_sampler(device, "Volume Sampler");
        let colormap_sampler = clamped_linear_sampler(device, "Colormap Sampler");

        let bind_group_layout = Self::layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&volume_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&volume_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&colormap_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&colormap_sampler),
                },
            ],
            label: Some("volume_bind_group"),
        });

        Self {
            volume: volume_texture,
            colormap: colormap_texture,
            bind_group,
            bind_group_layout,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    size: wgpu::Extent3d,
    dimension: wgpu::TextureDimension,
    format: wgpu::TextureFormat,
    data: &[u8],
    bytes_per_row: u32,
) -> wgpu::Texture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row),
            rows_per_image: Some(size.height),
        },
        size,
    );

    texture
}

fn clamped_linear_sampler(device: &wgpu::Device, label: &str) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
