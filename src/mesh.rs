//! # Mesh Module
//!
//! CPU-side geometry for the demos and its GPU counterpart.
//!
//! - [`Mesh`]: vertices plus triangle indices. The built-in shapes are the cube used by the
//!   3-D demos and the flat two-square figure of the colored faces demo. Meshes can also come
//!   from an OBJ file.
//! - [`GpuMesh`]: the vertex and index buffers created from a `Mesh`, bound once per frame.
//!
//! Triangles wind counter-clockwise when seen from outside the shape, which is what the
//! pipelines that cull back faces expect.

use std::io::BufRead;
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use anyhow::{ensure, Context};

use crate::vertex::Vertex;

/// Colors of the six faces in the order `+x, -x, +y, -y, +z, -z`.
pub type FaceColors = [[f32; 4]; 6];

pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Blue ramp used by the colored faces demos: `(0, 0.3, 0.1 + 0.2 i, 1)`.
pub fn ramp_colors() -> FaceColors {
    std::array::from_fn(|i| [0.0, 0.3, 0.1 + i as f32 * 0.2, 1.0])
}

// normal, u axis, v axis; u x v == normal.
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

// The two squares of the flat figure.
const FLAT_CORNERS: [[f32; 2]; 8] = [
    [-0.5, -0.5],
    [0.0, -0.5],
    [0.0, 0.0],
    [-0.5, 0.0],
    [-0.25, -0.25],
    [0.25, -0.25],
    [0.25, 0.25],
    [-0.25, 0.25],
];

const FLAT_FACES: [[usize; 6]; 6] = [
    [0, 5, 1, 0, 5, 4],
    [0, 1, 2, 2, 3, 0],
    [4, 5, 6, 6, 7, 4],
    [7, 3, 6, 3, 6, 2],
    [0, 4, 3, 3, 4, 7],
    [1, 2, 5, 2, 5, 6],
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// An axis-aligned cube of edge `size` centered on the origin, four vertices per face.
    pub fn cube(size: f32, colors: FaceColors) -> Self {
        let h = size * 0.5;
        let mut mesh = Self::default();

        for ((normal, u, v), color) in CUBE_FACES.iter().zip(colors) {
            let base = mesh.vertices.len() as u32;
            let corner = |su: f32, sv: f32| -> [f32; 3] {
                std::array::from_fn(|k| (normal[k] + su * u[k] + sv * v[k]) * h)
            };
            mesh.vertices.extend([
                Vertex::new(corner(-1.0, -1.0), *normal, [0.0, 0.0], color),
                Vertex::new(corner(1.0, -1.0), *normal, [1.0, 0.0], color),
                Vertex::new(corner(1.0, 1.0), *normal, [1.0, 1.0], color),
                Vertex::new(corner(-1.0, 1.0), *normal, [0.0, 1.0], color),
            ]);
            mesh.indices
                .extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
        }

        mesh
    }

    /// Two offset squares joined by four quads, drawn straight in clip space.
    pub fn flat_faces() -> Self {
        let mut mesh = Self::default();

        for (face, color) in FLAT_FACES.iter().zip(ramp_colors()) {
            for &corner in face {
                let [x, y] = FLAT_CORNERS[corner];
                mesh.indices.push(mesh.vertices.len() as u32);
                mesh.vertices.push(Vertex::new(
                    [x, y, 0.0],
                    [0.0, 0.0, 1.0],
                    [x + 0.5, y + 0.5],
                    color,
                ));
            }
        }

        mesh
    }

    /// Parses OBJ text. All objects are merged into one mesh of the given color.
    pub fn from_obj_reader(reader: &mut impl BufRead, color: [f32; 4]) -> anyhow::Result<Self> {
        let (models, _materials) = tobj::load_obj_buf(
            reader,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            // Materials are not used by any demo.
            |_| Err(tobj::LoadError::OpenFileFailed),
        )
        .context("failed to parse OBJ")?;

        let mut mesh = Self::default();
        for model in &models {
            let m = &model.mesh;
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend((0..m.positions.len() / 3).map(|i| {
                let attr3 = |data: &[f32]| -> [f32; 3] {
                    std::array::from_fn(|k| data.get(i * 3 + k).copied().unwrap_or(0.0))
                };
                Vertex::new(
                    attr3(&m.positions),
                    attr3(&m.normals),
                    [
                        m.texcoords.get(i * 2).copied().unwrap_or(0.0),
                        m.texcoords.get(i * 2 + 1).copied().unwrap_or(0.0),
                    ],
                    color,
                )
            }));
            mesh.indices.extend(m.indices.iter().map(|i| base + i));
        }

        ensure!(!mesh.indices.is_empty(), "OBJ contains no triangles");
        Ok(mesh)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_obj(path: impl AsRef<Path>, color: [f32; 4]) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open mesh {}", path.display()))?;
        let mesh = Self::from_obj_reader(&mut std::io::BufReader::new(file), color)
            .with_context(|| format!("invalid mesh {}", path.display()))?;
        log::info!(
            "Loaded {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        Ok(mesh)
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.vertices.first()?.position;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                std::array::from_fn(|k| lo[k].min(v.position[k])),
                std::array::from_fn(|k| hi[k].max(v.position[k])),
            )
        }))
    }

    /// Uniformly rescales and recenters so the mesh fits the cube `[-0.5, 0.5]^3`.
    ///
    /// The volume demos address the 3-D texture with object-space positions, so loaded meshes
    /// have to share the built-in cube's extent.
    pub fn fit_to_unit_cube(mut self) -> Self {
        let Some((lo, hi)) = self.bounds() else {
            return self;
        };
        let center: [f32; 3] = std::array::from_fn(|k| (lo[k] + hi[k]) * 0.5);
        let extent = (0..3).map(|k| hi[k] - lo[k]).fold(0.0f32, f32::max);
        let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };

        for vertex in &mut self.vertices {
            vertex.position = std::array::from_fn(|k| (vertex.position[k] - center[k]) * scale);
        }
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A mesh uploaded to the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,

    pub index_buffer: wgpu::Buffer,

    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn draw<'rpass>(&'rpass self, renderpass: &mut wgpu::RenderPass<'rpass>) {
        renderpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        renderpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        renderpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
