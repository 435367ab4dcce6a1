//! # Demo Module
//!
//! The catalog of demos. Each demo is one fixed WGSL program drawn over one mesh; they differ
//! in what the fragment stage does with the shared inputs.

use std::fmt;

/// The selectable demos, in keyboard order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Demo {
    /// Six flat faces of a two-square figure, each in its own color.
    Faces,
    /// A colored cube the keyboard moves around.
    Keyboard,
    /// A cube lit by one directional light.
    Diffuse,
    /// A cube painted through the transfer function.
    Colormap,
    /// A cube textured by sampling the volume at its surface.
    VolumeSurface,
    /// Rays marched through the volume and composited front to back.
    #[default]
    Raycast,
}

impl Demo {
    pub const ALL: [Demo; 6] = [
        Demo::Faces,
        Demo::Keyboard,
        Demo::Diffuse,
        Demo::Colormap,
        Demo::VolumeSurface,
        Demo::Raycast,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Demo::Faces => "Colored Faces",
            Demo::Keyboard => "Keyboard Interaction",
            Demo::Diffuse => "Diffuse Lighting",
            Demo::Colormap => "Colormap",
            Demo::VolumeSurface => "Volume Surface",
            Demo::Raycast => "Raycast",
        }
    }

    /// The demo's own WGSL; the shared prelude is prepended by [`crate::shader`].
    pub fn shader_source(self) -> &'static str {
        match self {
            Demo::Faces => include_str!("shaders/faces.wgsl"),
            Demo::Keyboard => include_str!("shaders/keyboard.wgsl"),
            Demo::Diffuse => include_str!("shaders/diffuse.wgsl"),
            Demo::Colormap => include_str!("shaders/colormap.wgsl"),
            Demo::VolumeSurface => include_str!("shaders/volume_surface.wgsl"),
            Demo::Raycast => include_str!("shaders/raycast.wgsl"),
        }
    }

    /// Whether the keyboard moves the object.
    pub fn is_interactive(self) -> bool {
        !matches!(self, Demo::Faces)
    }

    /// Whether back faces are culled. Ray marching must start exactly once per pixel.
    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self {
            Demo::Raycast => Some(wgpu::Face::Back),
            _ => None,
        }
    }

    /// Whether the demo samples the volume or the colormap.
    pub fn uses_volume(self) -> bool {
        matches!(self, Demo::Colormap | Demo::VolumeSurface | Demo::Raycast)
    }

    /// Position in [`Demo::ALL`], also the number key minus one.
    pub fn index(self) -> usize {
        Demo::ALL.iter().position(|d| *d == self).unwrap_or(0)
    }

    pub fn next(self) -> Demo {
        Demo::ALL[(self.index() + 1) % Demo::ALL.len()]
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_has_vertex_and_fragment_entry_points() {
        for demo in Demo::ALL {
            let source = demo.shader_source();
            assert!(source.contains("fn vertex_main"), "{demo} lacks vertex_main");
            assert!(source.contains("fn fragment_main"), "{demo} lacks fragment_main");
        }
    }

    #[test]
    fn index_matches_catalog_order() {
        for (i, demo) in Demo::ALL.into_iter().enumerate() {
            assert_eq!(demo.index(), i);
        }
        assert_eq!(Demo::Raycast.next(), Demo::Faces);
    }

    #[test]
    fn parses_from_command_line_names() {
        use clap::ValueEnum;
        assert_eq!(
            Demo::from_str("volume-surface", true).unwrap(),
            Demo::VolumeSurface
        );
        assert!(Demo::from_str("teapot", true).is_err());
    }
}
