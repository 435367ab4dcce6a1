//! # `renderer.rs` - Renderer Module
//!
//! The `Renderer` struct ties the GPU state, the depth buffer, the egui overlay renderer and the
//! current [`Scene`] together and records one frame at a time.
//!
//! ## Frame
//!
//! [`Renderer::render_frame`] updates the scene uniforms, uploads egui texture and buffer
//! changes, acquires the next surface texture, clears color and depth, draws the scene, draws
//! the overlay on top in the same pass, submits and presents.
//!
//! A lost or outdated surface (e.g. after a display change) is reconfigured and the frame is
//! skipped; running out of memory is reported as an error, and a timeout just skips the frame.
//!
//! ## Demo Switching
//!
//! The renderer keeps the startup [`Assets`] so [`Renderer::set_demo`] can build the scene of
//! another demo. The shader override, if any, only ever applies to the startup demo.

use crate::assets::Assets;
use crate::controls::Motion;
use crate::demo::Demo;
use crate::gpu::Gpu;
use crate::scene::{Scene, VolumeSettings};

pub struct Renderer {
    gpu: Gpu,

    depth_texture_view: wgpu::TextureView,

    egui_renderer: egui_wgpu::Renderer,

    scene: Scene,

    assets: Assets,

    startup_demo: Demo,
}

impl Renderer {
    /// The format of the depth buffer shared by all pipelines.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        demo: Demo,
        assets: Assets,
        settings: VolumeSettings,
    ) -> anyhow::Result<Self> {
        let gpu = Gpu::new_async(window, width, height).await?;

        let depth_texture_view = gpu.create_depth_texture(width, height);

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            Some(Self::DEPTH_FORMAT),
            1,
            false,
        );

        let scene = Scene::new(
            &gpu.device,
            &gpu.queue,
            gpu.surface_format,
            demo,
            &assets,
            assets.shader.as_deref(),
            settings,
        )?;

        Ok(Self {
            gpu,
            depth_texture_view,
            egui_renderer,
            scene,
            assets,
            startup_demo: demo,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_texture_view = self.gpu.create_depth_texture(width, height);
    }

    pub fn demo(&self) -> Demo {
        self.scene.demo
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// Replaces the scene with the one of `demo`. The current scene stays on failure.
    pub fn set_demo(&mut self, demo: Demo) -> anyhow::Result<()> {
        if demo == self.scene.demo {
            return Ok(());
        }
        let shader_body = if demo == self.startup_demo {
            self.assets.shader.as_deref()
        } else {
            None
        };
        let scene = Scene::new(
            &self.gpu.device,
            &self.gpu.queue,
            self.gpu.surface_format,
            demo,
            &self.assets,
            shader_body,
            self.scene.settings,
        )?;
        log::info!("Switched to demo '{demo}'");
        self.scene = scene;
        Ok(())
    }

    pub fn render_frame(
        &mut self,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
        paint_jobs: Vec<egui::epaint::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
        delta_time: crate::Duration,
        motion: &Motion,
    ) -> anyhow::Result<()> {
        let delta_time = delta_time.as_secs_f32();

        self.scene
            .update(&self.gpu.queue, self.gpu.aspect_ratio(), delta_time, motion);

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
        }

        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                self.free_textures(&textures_delta);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame");
                self.free_textures(&textures_delta);
                return Ok(());
            }
            Err(error) => anyhow::bail!("Failed to get surface texture: {error}"),
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        let surface_texture_view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.gpu.surface_format),
            ..Default::default()
        });

        encoder.insert_debug_marker("Render scene");

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.scene.render(&mut render_pass);

            self.egui_renderer.render(
                &mut render_pass.forget_lifetime(),
                &paint_jobs,
                &screen_descriptor,
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        self.free_textures(&textures_delta);
        Ok(())
    }

    fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
