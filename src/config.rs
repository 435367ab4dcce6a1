//! Command-line configuration.
//!
//! Everything has a default, so running without arguments opens the ray caster on a
//! synthetic volume with the built-in colormap.

use std::path::PathBuf;

use clap::Parser;

use crate::demo::Demo;
use crate::scene::MAX_STEPS;
use crate::volume::SampleType;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "raycast", version, about = "Interactive cube and volume rendering demos")]
pub struct Config {
    /// Demo shown at startup
    #[arg(long, value_enum, default_value_t = Demo::default())]
    pub demo: Demo,

    /// Raw volume file; a synthetic sphere is used when omitted
    #[arg(long)]
    pub volume: Option<PathBuf>,

    /// Voxel counts of the raw volume, e.g. 128x128x128 (a single number means a cube)
    #[arg(long, value_parser = parse_dims, default_value = "128x128x128")]
    pub dims: [u32; 3],

    /// Sample encoding of the raw volume
    #[arg(long, value_enum, default_value_t = SampleType::default())]
    pub sample_type: SampleType,

    /// Colormap image; its first row is used as the transfer function
    #[arg(long)]
    pub colormap: Option<PathBuf>,

    /// OBJ mesh to draw instead of the built-in cube
    #[arg(long)]
    pub mesh: Option<PathBuf>,

    /// WGSL body replacing the startup demo's program
    #[arg(long)]
    pub shader: Option<PathBuf>,

    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Ray steps across the volume diagonal, at most 2048
    #[arg(long, default_value_t = 256, value_parser = clap::value_parser!(u32).range(1..=MAX_STEPS as i64))]
    pub steps: u32,

    /// Opacity scale of the ray caster
    #[arg(long, default_value_t = 4.0)]
    pub density: f32,

    /// Normalized values below this are transparent
    #[arg(long, default_value_t = 0.05)]
    pub threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["raycast"])
    }
}

/// Parses `WxHxD`, `W,H,D` or a single edge length.
pub fn parse_dims(text: &str) -> Result<[u32; 3], String> {
    let parts = text
        .split(['x', 'X', ','])
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension `{part}`: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let dims = match parts.as_slice() {
        [edge] => [*edge; 3],
        [w, h, d] => [*w, *h, *d],
        _ => return Err(format!("expected 1 or 3 dimensions, got `{text}`")),
    };
    if dims.contains(&0) {
        return Err(format!("dimensions must be non-zero, got `{text}`"));
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_the_ray_caster() {
        let config = Config::default();
        assert_eq!(config.demo, Demo::Raycast);
        assert_eq!(config.dims, [128, 128, 128]);
        assert_eq!(config.sample_type, SampleType::I32);
        assert_eq!((config.width, config.height), (1024, 768));
        assert!(config.volume.is_none());
    }

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from([
            "raycast",
            "--demo",
            "diffuse",
            "--volume",
            "scan.raw",
            "--dims",
            "64,32,16",
            "--sample-type",
            "u16",
            "--steps",
            "512",
        ])
        .unwrap();
        assert_eq!(config.demo, Demo::Diffuse);
        assert_eq!(config.volume, Some(PathBuf::from("scan.raw")));
        assert_eq!(config.dims, [64, 32, 16]);
        assert_eq!(config.sample_type, SampleType::U16);
        assert_eq!(config.steps, 512);
    }

    #[test]
    fn dims_forms() {
        assert_eq!(parse_dims("128"), Ok([128; 3]));
        assert_eq!(parse_dims("4x5x6"), Ok([4, 5, 6]));
        assert!(parse_dims("4x5").is_err());
        assert!(parse_dims("0x5x6").is_err());
        assert!(parse_dims("ax5x6").is_err());
    }

    #[test]
    fn steps_stay_within_the_ray_loop() {
        assert!(Config::try_parse_from(["raycast", "--steps", "4096"]).is_err());
        assert!(Config::try_parse_from(["raycast", "--steps", "0"]).is_err());
        let config = Config::try_parse_from(["raycast", "--steps", "2048"]).unwrap();
        assert_eq!(config.steps, MAX_STEPS);
    }

    #[test]
    fn rejects_unknown_demo() {
        assert!(Config::try_parse_from(["raycast", "--demo", "teapot"]).is_err());
    }
}
