//! # Raycast Library
//!
//! Interactive WebGPU demos that build up from a flat colored cube to front-to-back volume ray
//! casting. A scalar volume is loaded from a raw file (or synthesized), normalized to 8 bits,
//! uploaded as a 3-D texture and rendered through a colormap used as the transfer function.
//!
//! ## Modules
//!
//! - [`app`]: window, egui overlay and keyboard routing.
//! - [`renderer`]: owns the GPU state and the current scene, records each frame.
//! - [`gpu`]: surface, device and queue bring-up.
//! - [`scene`]: one demo's mesh, uniforms, textures and pipeline.
//! - [`demo`]: the catalog of demos and their WGSL.
//! - [`shader`]: prelude composition and checked shader module creation.
//! - [`volume`]: raw volume decoding and normalization.
//! - [`colormap`]: the transfer function texture.
//! - [`mesh`]: the cube, the flat faces figure and OBJ loading.
//! - [`controls`]: held keys and the model transform they drive.
//! - [`config`] and [`assets`]: command-line flags and the files they name.
//!
//! ## Example
//!
//! ```ignore
//! use raycast_core::{App, Assets, Config};
//! use winit::event_loop::EventLoop;
//!
//! let config = Config::default();
//! let assets = Assets::load(&config)?;
//! EventLoop::new()?.run_app(&mut App::new(config, assets))?;
//! ```

pub mod app;
pub mod assets;
pub mod colormap;
pub mod config;
pub mod controls;
pub mod demo;
pub mod gpu;
pub mod mesh;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod uniform_binding;
pub mod uniform_buffer;
pub mod vertex;
pub mod volume;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub use web_time::Duration;

pub use crate::app::App;
pub use crate::assets::Assets;
pub use crate::colormap::Colormap;
pub use crate::config::Config;
pub use crate::controls::{Action, Controls, ModelTransform, Motion};
pub use crate::demo::Demo;
pub use crate::gpu::Gpu;
pub use crate::mesh::Mesh;
pub use crate::renderer::Renderer;
pub use crate::scene::{Scene, VolumeSettings};
pub use crate::uniform_binding::UniformBinding;
pub use crate::uniform_buffer::UniformBuffer;
pub use crate::vertex::Vertex;
pub use crate::volume::{SampleType, Volume};

/// Loads the configured assets and runs the event loop until the window closes.
pub fn run(config: Config) -> anyhow::Result<()> {
    let assets = Assets::load(&config)?;
    let event_loop = winit::event_loop::EventLoop::new()?;

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = App::new(config, assets);
        event_loop.run_app(&mut app)?;
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(App::new(config, assets));
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    console_log::init_with_level(log::Level::Info)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    run(Config::default()).map_err(|error| JsValue::from_str(&format!("{error:#}")))
}
