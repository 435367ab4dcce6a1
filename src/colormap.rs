//! # Colormap Module
//!
//! The transfer function used by the volume demos: a strip of RGBA texels that maps a
//! normalized scalar in `0..=1` to a display color. The GPU samples it as a `width x 1`
//! texture with linear filtering and edge clamping; [`Colormap::sample`] performs the same
//! lookup on the CPU.

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use anyhow::{ensure, Context};

/// Width of the built-in map, matching the bundled `matplotlib-virdis.png` strip.
pub const DEFAULT_WIDTH: usize = 180;

// Viridis, sampled at eighths.
const VIRIDIS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [71, 44, 122],
    [59, 81, 139],
    [44, 113, 142],
    [33, 145, 140],
    [39, 173, 129],
    [92, 200, 99],
    [170, 220, 50],
    [253, 231, 37],
];

#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    /// Never empty.
    texels: Vec<[u8; 4]>,
}

impl Colormap {
    pub fn new(texels: Vec<[u8; 4]>) -> anyhow::Result<Self> {
        ensure!(!texels.is_empty(), "colormap needs at least one texel");
        Ok(Self { texels })
    }

    /// Perceptually uniform default map, opaque.
    pub fn viridis() -> Self {
        let last = (VIRIDIS.len() - 1) as f32;
        let texels = (0..DEFAULT_WIDTH)
            .map(|i| {
                let t = i as f32 / (DEFAULT_WIDTH - 1) as f32 * last;
                let i0 = (t.floor() as usize).min(VIRIDIS.len() - 2);
                let f = t - i0 as f32;
                let (a, b) = (VIRIDIS[i0], VIRIDIS[i0 + 1]);
                let mix = |c: usize| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * f).round() as u8;
                [mix(0), mix(1), mix(2), 255]
            })
            .collect();
        Self { texels }
    }

    /// Decodes an image and keeps one row of it.
    ///
    /// Images are flipped vertically first, so for anything taller than one row the bottom
    /// row of the file is the one used.
    pub fn from_image_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let image = image::load_from_memory(bytes)
            .context("failed to decode colormap image")?
            .flipv()
            .to_rgba8();
        let texels = image
            .rows()
            .next()
            .context("colormap image has no rows")?
            .map(|pixel| pixel.0)
            .collect();
        Self::new(texels)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read colormap {}", path.display()))?;
        let colormap = Self::from_image_bytes(&bytes)
            .with_context(|| format!("invalid colormap {}", path.display()))?;
        log::info!(
            "Loaded colormap {} ({} texels)",
            path.display(),
            colormap.width()
        );
        Ok(colormap)
    }

    pub fn width(&self) -> u32 {
        self.texels.len() as u32
    }

    /// Linear lookup with texel-center addressing, clamped at both ends.
    pub fn sample(&self, t: f32) -> [u8; 4] {
        let n = self.texels.len();
        let pos = (t.clamp(0.0, 1.0) * n as f32 - 0.5).clamp(0.0, (n - 1) as f32);
        let i0 = pos.floor() as usize;
        let i1 = (i0 + 1).min(n - 1);
        let f = pos - i0 as f32;
        let (a, b) = (self.texels[i0], self.texels[i1]);
        std::array::from_fn(|c| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * f).round() as u8)
    }

    /// Raw texel bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::viridis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viridis_spans_dark_purple_to_yellow() {
        let map = Colormap::viridis();
        assert_eq!(map.width(), DEFAULT_WIDTH as u32);
        assert_eq!(map.texels[0], [68, 1, 84, 255]);
        assert_eq!(map.texels[DEFAULT_WIDTH - 1], [253, 231, 37, 255]);
        assert_eq!(map.as_bytes().len(), DEFAULT_WIDTH * 4);
    }

    #[test]
    fn sample_clamps_and_interpolates() {
        let map = Colormap::new(vec![[0, 0, 0, 255], [200, 100, 50, 255]]).unwrap();
        assert_eq!(map.sample(-1.0), [0, 0, 0, 255]);
        assert_eq!(map.sample(0.0), [0, 0, 0, 255]);
        assert_eq!(map.sample(0.5), [100, 50, 25, 255]);
        assert_eq!(map.sample(1.0), [200, 100, 50, 255]);
        assert_eq!(map.sample(7.0), [200, 100, 50, 255]);
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(Colormap::new(Vec::new()).is_err());
    }

    #[test]
    fn single_texel_map_samples_everywhere() {
        let map = Colormap::new(vec![[9, 8, 7, 6]]).unwrap();
        for t in [-1.0, 0.0, 0.5, 1.0, 3.0] {
            assert_eq!(map.sample(t), [9, 8, 7, 6]);
        }
        assert_eq!(map.width(), 1);
    }

    #[test]
    fn decodes_png_strip() {
        let mut strip = image::RgbaImage::new(3, 1);
        strip.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        strip.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        strip.put_pixel(2, 0, image::Rgba([0, 0, 255, 128]));

        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(strip)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let map = Colormap::from_image_bytes(&png).unwrap();
        assert_eq!(
            map.texels,
            vec![[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 128]]
        );
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(Colormap::from_image_bytes(b"not an image").is_err());
    }
}
