//! Startup resources resolved from the [`Config`].
//!
//! Files named on the command line are loaded here, before any window exists, so a missing or
//! malformed file stops the program with a readable error instead of a blank window. Anything
//! not named falls back to a built-in: the synthetic sphere volume, the viridis colormap and
//! the unit cube. On the web there is no file system and only the built-ins are used.

use crate::colormap::Colormap;
use crate::config::Config;
use crate::mesh::Mesh;
use crate::volume::Volume;

/// Edge length of the synthetic volume.
pub const SYNTHETIC_EDGE: u32 = 64;

#[derive(Clone, Debug)]
pub struct Assets {
    pub volume: Volume,

    pub colormap: Colormap,

    /// Replaces the built-in cube in the 3-D demos.
    pub mesh: Option<Mesh>,

    /// Replaces the startup demo's WGSL body.
    pub shader: Option<String>,
}

impl Assets {
    /// Built-in resources only.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self {
            volume: Volume::sphere([SYNTHETIC_EDGE; 3])?,
            colormap: Colormap::viridis(),
            mesh: None,
            shader: None,
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        let mut assets = Self::builtin()?;

        if let Some(path) = &config.volume {
            assets.volume = Volume::load_raw(path, config.dims, config.sample_type)?;
        } else {
            log::info!("No volume given, using a synthetic {SYNTHETIC_EDGE}^3 sphere");
        }

        if let Some(path) = &config.colormap {
            assets.colormap = Colormap::load(path)?;
        }

        if let Some(path) = &config.mesh {
            assets.mesh = Some(Mesh::load_obj(path, crate::mesh::WHITE)?.fit_to_unit_cube());
        }

        if let Some(path) = &config.shader {
            assets.shader = Some(crate::shader::load_body(path)?);
        }

        Ok(assets)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        if config.volume.is_some() || config.colormap.is_some() || config.mesh.is_some() {
            log::warn!("File assets are not available on the web; using built-ins");
        }
        Self::builtin()
    }
}
