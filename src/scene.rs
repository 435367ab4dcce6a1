//! # Scene Module
//!
//! The `Scene` struct holds everything one demo draws: the mesh buffers, the uniform block,
//! the volume and colormap textures, the render pipeline and the object's transform. A scene
//! is built for one [`Demo`]; switching demos builds a new scene.
//!
//! ## Frame Flow
//!
//! 1. [`Scene::update`] folds the keyboard motion into the model matrix (interactive demos
//!    only), recomputes the camera for the current aspect ratio and writes the uniform block.
//! 2. [`Scene::render`] binds the pipeline, both bind groups and the mesh, and issues one
//!    indexed draw.
//!
//! ## Camera
//!
//! A fixed right-handed perspective camera looks at the origin from above and to the right,
//! so the cube shows three faces before any interaction. The flat faces demo bypasses the
//! camera and draws in clip space.

use anyhow::ensure;

use crate::assets::Assets;
use crate::colormap::Colormap;
use crate::controls::{ModelTransform, Motion};
use crate::demo::Demo;
use crate::mesh::{GpuMesh, Mesh};
use crate::renderer::Renderer;
use crate::shader;
use crate::texture::TextureBinding;
use crate::uniform_binding::UniformBinding;
use crate::uniform_buffer::UniformBuffer;
use crate::vertex::Vertex;
use crate::volume::Volume;

/// Camera position in world space.
pub const EYE: [f32; 3] = [1.2, 1.0, 2.2];

/// Direction the light travels.
pub const LIGHT_DIR: [f32; 3] = [-0.4, -0.7, -0.6];

/// Vertical field of view in degrees.
pub const FOV_Y: f32 = 45.0;

/// Upper bound of the ray step count. The ray caster loop runs at most this many iterations,
/// so more steps would stop rays before they leave the volume.
pub const MAX_STEPS: u32 = 2048;

/// Ray caster parameters, adjustable at runtime.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VolumeSettings {
    /// Ray steps across the volume diagonal.
    pub steps: u32,

    /// Opacity scale.
    pub density: f32,

    /// Normalized values below this are transparent.
    pub threshold: f32,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self {
            steps: 256,
            density: 4.0,
            threshold: 0.05,
        }
    }
}

pub struct Scene {
    pub demo: Demo,

    pub transform: ModelTransform,

    pub settings: VolumeSettings,

    pub mesh: GpuMesh,

    pub uniform: UniformBinding,

    pub textures: TextureBinding,

    pub pipeline: wgpu::RenderPipeline,

    volume_dims: [u32; 3],

    elapsed: f32,
}

impl Scene {
    /// Builds the scene of `demo`. `shader_body` replaces the demo's own WGSL when given.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        demo: Demo,
        assets: &Assets,
        shader_body: Option<&str>,
        settings: VolumeSettings,
    ) -> anyhow::Result<Self> {
        check_texture_limits(&assets.volume, &assets.colormap, &device.limits())?;

        let mesh = Self::mesh_for(demo, assets);
        log::info!(
            "Building scene '{}' ({} triangles)",
            demo,
            mesh.triangle_count()
        );

        let mesh = GpuMesh::new(device, &mesh);
        let uniform = UniformBinding::new(device);
        let textures = TextureBinding::new(device, queue, &assets.volume, &assets.colormap);
        let module = Self::shader_module(device, demo, shader_body);
        let pipeline = Self::create_pipeline(device, surface_format, demo, &module, &uniform, &textures);

        Ok(Self {
            demo,
            transform: ModelTransform::default(),
            settings,
            mesh,
            uniform,
            textures,
            pipeline,
            volume_dims: assets.volume.dims,
            elapsed: 0.0,
        })
    }

    fn mesh_for(demo: Demo, assets: &Assets) -> Mesh {
        match (demo, &assets.mesh) {
            (Demo::Faces, _) => Mesh::flat_faces(),
            (_, Some(mesh)) => mesh.clone(),
            (Demo::Keyboard, None) => Mesh::cube(1.0, crate::mesh::ramp_colors()),
            (Demo::Diffuse, None) => Mesh::cube(1.0, [[0.9, 0.55, 0.2, 1.0]; 6]),
            (_, None) => Mesh::cube(1.0, [crate::mesh::WHITE; 6]),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn shader_module(device: &wgpu::Device, demo: Demo, body: Option<&str>) -> wgpu::ShaderModule {
        if let Some(body) = body {
            match shader::create_checked_module(device, demo.title(), body) {
                Ok(module) => return module,
                Err(error) => log::error!("{error:#}; falling back to the built-in program"),
            }
        }
        shader::create_module(device, demo.title(), demo.shader_source())
    }

    #[cfg(target_arch = "wasm32")]
    fn shader_module(device: &wgpu::Device, demo: Demo, body: Option<&str>) -> wgpu::ShaderModule {
        shader::create_module(device, demo.title(), body.unwrap_or(demo.shader_source()))
    }

    pub fn render<'rpass>(&'rpass self, renderpass: &mut wgpu::RenderPass<'rpass>) {
        renderpass.set_pipeline(&self.pipeline);
        renderpass.set_bind_group(0, &self.uniform.bind_group, &[]);
        renderpass.set_bind_group(1, &self.textures.bind_group, &[]);
        self.mesh.draw(renderpass);
    }

    pub fn update(&mut self, queue: &wgpu::Queue, aspect_ratio: f32, delta_time: f32, motion: &Motion) {
        self.elapsed += delta_time;

        if self.demo.is_interactive() {
            self.transform.apply(motion);
        }

        let uniform_buffer = self.uniforms(aspect_ratio);
        self.uniform.update_buffer(queue, 0, uniform_buffer);
    }

    /// The uniform block for the current state.
    pub fn uniforms(&self, aspect_ratio: f32) -> UniformBuffer {
        frame_uniforms(
            &self.transform,
            &self.settings,
            self.volume_dims,
            self.elapsed,
            aspect_ratio,
        )
    }

    fn create_pipeline(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        demo: Demo,
        shader_module: &wgpu::ShaderModule,
        uniform: &UniformBinding,
        textures: &TextureBinding,
    ) -> wgpu::RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Demo Pipeline Layout"),
            bind_group_layouts: &[&uniform.bind_group_layout, &textures.bind_group_layout],
            push_constant_ranges: &[],
        });

        // The ray caster outputs premultiplied color.
        let blend = match demo {
            Demo::Raycast => wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            _ => wgpu::BlendState::ALPHA_BLENDING,
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(demo.title()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader_module,
                entry_point: Some(shader::VERTEX_ENTRY),
                buffers: &[Vertex::description(&Vertex::vertex_attributes())],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: demo.cull_mode(),
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Renderer::DEPTH_FORMAT,
                depth_write_enabled: true,
                // Equal depth passes so later flat faces draw over earlier ones.
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader_module,
                entry_point: Some(shader::FRAGMENT_ENTRY),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        })
    }
}

/// Fails when the volume or the colormap does not fit the device's texture size limits.
pub fn check_texture_limits(
    volume: &Volume,
    colormap: &Colormap,
    limits: &wgpu::Limits,
) -> anyhow::Result<()> {
    let max_3d = limits.max_texture_dimension_3d;
    ensure!(
        volume.dims.iter().all(|&d| d <= max_3d),
        "volume {:?} exceeds the device's 3-D texture limit of {}",
        volume.dims,
        max_3d
    );

    let max_2d = limits.max_texture_dimension_2d;
    ensure!(
        colormap.width() <= max_2d,
        "colormap is {} texels wide but the device's 2-D texture limit is {}",
        colormap.width(),
        max_2d
    );
    Ok(())
}

/// Builds the uniform block from the object transform, camera and volume settings.
pub fn frame_uniforms(
    transform: &ModelTransform,
    settings: &VolumeSettings,
    volume_dims: [u32; 3],
    elapsed: f32,
    aspect_ratio: f32,
) -> UniformBuffer {
    let projection = nalgebra_glm::perspective_rh_zo(aspect_ratio, FOV_Y.to_radians(), 0.1, 100.0);

    let eye = nalgebra_glm::make_vec3(&EYE);
    let view = nalgebra_glm::look_at_rh(
        &eye,
        &nalgebra_glm::vec3(0.0, 0.0, 0.0),
        &nalgebra_glm::Vec3::y(),
    );

    let model = transform.model;
    let model_inv = model
        .try_inverse()
        .unwrap_or_else(nalgebra_glm::Mat4::identity);

    let [w, h, d] = volume_dims;
    let light_dir = nalgebra_glm::normalize(&nalgebra_glm::make_vec3(&LIGHT_DIR));

    UniformBuffer {
        model,
        model_inv,
        view_proj: projection * view,
        eye: nalgebra_glm::vec3_to_vec4(&eye),
        light_dir: nalgebra_glm::vec3_to_vec4(&light_dir),
        volume_dims: nalgebra_glm::vec4(w as f32, h as f32, d as f32, settings.steps as f32),
        params: nalgebra_glm::vec4(settings.density, settings.threshold, elapsed, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(uniforms: &UniformBuffer, p: [f32; 3]) -> nalgebra_glm::Vec4 {
        uniforms.view_proj * uniforms.model * nalgebra_glm::vec4(p[0], p[1], p[2], 1.0)
    }

    #[test]
    fn cube_is_in_front_of_the_camera() {
        let uniforms = frame_uniforms(
            &ModelTransform::default(),
            &VolumeSettings::default(),
            [128; 3],
            0.0,
            4.0 / 3.0,
        );
        for corner in [[-0.5, -0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5]] {
            let c = clip(&uniforms, corner);
            assert!(c.w > 0.0);
            let ndc = c.xyz() / c.w;
            assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn nearer_faces_get_smaller_depth() {
        let uniforms = frame_uniforms(
            &ModelTransform::default(),
            &VolumeSettings::default(),
            [128; 3],
            0.0,
            1.0,
        );
        let near = clip(&uniforms, [0.0, 0.0, 0.5]);
        let far = clip(&uniforms, [0.0, 0.0, -0.5]);
        assert!(near.z / near.w < far.z / far.w);
    }

    #[test]
    fn inverse_model_brings_eye_into_object_space() {
        let mut transform = ModelTransform::default();
        transform.apply(&Motion {
            translate: nalgebra_glm::vec3(0.3, -0.2, 0.0),
            scale: 2.0,
            rotate: nalgebra_glm::vec3(0.1, 0.2, 0.3),
        });
        let uniforms = frame_uniforms(&transform, &VolumeSettings::default(), [8; 3], 0.0, 1.0);

        let eye = nalgebra_glm::vec4(EYE[0], EYE[1], EYE[2], 1.0);
        let round_trip = uniforms.model * (uniforms.model_inv * eye);
        assert!((round_trip - eye).norm() < 1e-4);
    }

    #[test]
    fn packs_volume_parameters() {
        let settings = VolumeSettings {
            steps: 300,
            density: 2.5,
            threshold: 0.1,
        };
        let uniforms = frame_uniforms(&ModelTransform::default(), &settings, [64, 32, 16], 1.5, 1.0);
        assert_eq!(uniforms.volume_dims, nalgebra_glm::vec4(64.0, 32.0, 16.0, 300.0));
        assert_eq!(uniforms.params, nalgebra_glm::vec4(2.5, 0.1, 1.5, 0.0));
        assert!((uniforms.light_dir.xyz().norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_loop_bound_matches_step_limit() {
        let declaration = format!("const MAX_STEPS: i32 = {MAX_STEPS};");
        assert!(Demo::Raycast.shader_source().contains(&declaration));
    }

    #[test]
    fn oversized_textures_are_rejected() {
        let limits = wgpu::Limits::downlevel_webgl2_defaults();
        let small_volume = Volume::sphere([8; 3]).unwrap();
        let viridis = Colormap::viridis();
        assert!(check_texture_limits(&small_volume, &viridis, &limits).is_ok());

        let wide = Colormap::new(vec![[0, 0, 0, 255]; limits.max_texture_dimension_2d as usize + 1])
            .unwrap();
        let err = check_texture_limits(&small_volume, &wide, &limits).unwrap_err();
        assert!(err.to_string().contains("colormap"));

        let long_volume = Volume {
            dims: [limits.max_texture_dimension_3d + 1, 1, 1],
            data: vec![0; limits.max_texture_dimension_3d as usize + 1],
            min: 0.0,
            max: 1.0,
        };
        let err = check_texture_limits(&long_volume, &viridis, &limits).unwrap_err();
        assert!(err.to_string().contains("volume"));
    }
}
