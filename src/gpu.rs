//! # GPU Module
//!
//! This module defines the `Gpu` struct, which owns the WGPU objects every frame needs: the
//! surface the window presents, the logical device, its queue and the surface configuration.
//!
//! ## Initialization
//!
//! [`Gpu::new_async`] walks the usual WGPU bring-up sequence:
//!
//! 1. create an `Instance` and a `Surface` for the window,
//! 2. request an adapter compatible with that surface,
//! 3. request a device and queue within the adapter's limits,
//! 4. pick a non-sRGB surface format (egui expects one) and configure the surface.
//!
//! Every step that can fail returns an error instead of panicking, so the caller can report
//! which part of the bring-up went wrong. After creation, validation errors raised by the
//! device are logged through the uncaptured error handler rather than aborting the process.
//!
//! ## Resizing
//!
//! [`Gpu::resize`] reconfigures the surface; the depth texture has to be recreated alongside it
//! with [`Gpu::create_depth_texture`].

use anyhow::Context;

use wgpu::InstanceDescriptor;

/// The GPU state shared by the renderer and the scene.
pub struct Gpu {
    /// The window surface frames are presented to.
    pub surface: wgpu::Surface<'static>,

    /// The logical device used to create buffers, textures and pipelines.
    pub device: wgpu::Device,

    /// The queue command buffers and buffer writes are submitted to.
    pub queue: wgpu::Queue,

    /// Current surface size, format and presentation settings.
    pub surface_config: wgpu::SurfaceConfiguration,

    /// The color format render pipelines target.
    pub surface_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Width over height of the surface, safe for a minimized window.
    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Reconfigures the surface for a new window size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Re-applies the current configuration after the surface was lost or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Creates a `Depth32Float` view matching the surface size.
    pub fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(
            &(wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width: width.max(1),
                    height: height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Depth32Float,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            }),
        );
        texture.create_view(&wgpu::TextureViewDescriptor {
            label: None,
            format: Some(wgpu::TextureFormat::Depth32Float),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            base_array_layer: 0,
            array_layer_count: None,
            mip_level_count: None,
            usage: None,
        })
    }

    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let surface = instance
            .create_surface(window)
            .context("Failed to create surface!")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter!")?;

        log::info!("WGPU Adapter: {:?}", adapter.get_info());

        let (device, queue) = {
            log::info!("WGPU Adapter Features: {:#?}", adapter.features());
            adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("WGPU Device"),
                        memory_hints: wgpu::MemoryHints::default(),
                        required_features: wgpu::Features::default(),
                        #[cfg(not(target_arch = "wasm32"))]
                        required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                        #[cfg(all(target_arch = "wasm32", feature = "webgpu"))]
                        required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                        #[cfg(all(target_arch = "wasm32", feature = "webgl"))]
                        required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                            .using_resolution(adapter.limits()),
                    },
                    None,
                )
                .await
                .context("Failed to request a device!")?
        };

        // Validation errors outside an error scope end up here.
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("[WGPU Error] {error}");
        }));

        let surface_capabilities = surface.get_capabilities(&adapter);

        let surface_format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb()) // egui wants a non-srgb surface texture
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no supported formats!")?;

        let present_mode = surface_capabilities
            .present_modes
            .first()
            .copied()
            .unwrap_or(wgpu::PresentMode::Fifo);

        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
        })
    }
}
