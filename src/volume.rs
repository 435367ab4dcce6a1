//! # Volume Module
//!
//! Loading and normalization of scalar volume datasets. A scan arrives as a raw, headerless
//! file of little-endian samples laid out x-fastest, then y, then z. The renderer only ever
//! sees the normalized form: one byte per voxel, produced by a linear remap of the sample
//! range onto `0..=255`, which is uploaded as a single channel 3-D texture.
//!
//! ## Overview
//!
//! - [`SampleType`]: the on-disk sample encoding.
//! - [`Volume`]: a normalized byte volume together with the value range it was mapped from.
//! - [`value_range`] / [`normalize`]: the min/max remap, exposed separately so it can be
//!   reused on samples that did not come from a file.
//!
//! ## Example
//!
//! ```ignore
//! let volume = Volume::load_raw("res/textures/cube_128x128x128.raw", [128, 128, 128], SampleType::I32)?;
//! log::info!("min {} max {}", volume.min, volume.max);
//! ```

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

use anyhow::{bail, Context};

/// Encoding of the samples stored in a raw volume file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SampleType {
    I8,
    U8,
    I16,
    U16,
    #[default]
    I32,
    U32,
    F32,
}

impl SampleType {
    /// Width of one sample in bytes.
    pub fn size(self) -> usize {
        match self {
            SampleType::I8 | SampleType::U8 => 1,
            SampleType::I16 | SampleType::U16 => 2,
            SampleType::I32 | SampleType::U32 | SampleType::F32 => 4,
        }
    }

    fn decode(self, bytes: &[u8]) -> Vec<f32> {
        let chunks = bytes.chunks_exact(self.size());
        match self {
            SampleType::I8 => chunks.map(|c| c[0] as i8 as f32).collect(),
            SampleType::U8 => chunks.map(|c| c[0] as f32).collect(),
            SampleType::I16 => chunks.map(|c| i16::from_le_bytes(le(c)) as f32).collect(),
            SampleType::U16 => chunks.map(|c| u16::from_le_bytes(le(c)) as f32).collect(),
            SampleType::I32 => chunks.map(|c| i32::from_le_bytes(le(c)) as f32).collect(),
            SampleType::U32 => chunks.map(|c| u32::from_le_bytes(le(c)) as f32).collect(),
            SampleType::F32 => chunks.map(|c| f32::from_le_bytes(le(c))).collect(),
        }
    }
}

fn le<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(chunk);
    bytes
}

/// Smallest and largest finite sample, or `None` when there is none.
pub fn value_range(samples: &[f32]) -> Option<(f32, f32)> {
    samples
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(None, |range, s| match range {
            None => Some((s, s)),
            Some((min, max)) => Some((min.min(s), max.max(s))),
        })
}

/// Maps every sample linearly from `range` onto `0..=255`, truncating toward zero.
///
/// A degenerate range (`max == min`) maps everything to zero. Non-finite samples map to zero.
pub fn normalize(samples: &[f32], (min, max): (f32, f32)) -> Vec<u8> {
    let span = max - min;
    if span <= 0.0 {
        return vec![0; samples.len()];
    }
    samples
        .iter()
        .map(|&s| {
            if s.is_finite() {
                (255.0 * ((s - min) / span)) as u8
            } else {
                0
            }
        })
        .collect()
}

/// A normalized scalar volume.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    /// Voxel counts along x, y and z.
    pub dims: [u32; 3],

    /// One byte per voxel, x-fastest.
    pub data: Vec<u8>,

    /// Source value mapped to `0`.
    pub min: f32,

    /// Source value mapped to `255`.
    pub max: f32,
}

impl Volume {
    /// Number of voxels `dims` describes, rejecting empty or overflowing shapes.
    pub fn voxel_count(dims: [u32; 3]) -> anyhow::Result<usize> {
        if dims.contains(&0) {
            bail!("volume dimensions must be non-zero, got {dims:?}");
        }
        dims.iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
            .with_context(|| format!("volume dimensions {dims:?} overflow"))
    }

    /// Decodes and normalizes a raw scan held in memory.
    pub fn from_raw_bytes(
        bytes: &[u8],
        dims: [u32; 3],
        sample_type: SampleType,
    ) -> anyhow::Result<Self> {
        let count = Self::voxel_count(dims)?;
        let needed = count
            .checked_mul(sample_type.size())
            .context("volume byte size overflows")?;

        if bytes.len() < needed {
            bail!(
                "raw volume holds {} bytes but {:?} {:?} samples need {}",
                bytes.len(),
                dims,
                sample_type,
                needed
            );
        }
        if bytes.len() > needed {
            log::warn!(
                "Ignoring {} trailing bytes after {:?} volume",
                bytes.len() - needed,
                dims
            );
        }

        let samples = sample_type.decode(&bytes[..needed]);
        let (min, max) = value_range(&samples).unwrap_or((0.0, 0.0));
        if min == max {
            log::warn!("Volume is constant ({min}); every voxel normalizes to 0");
        }
        let data = normalize(&samples, (min, max));

        Ok(Self {
            dims,
            data,
            min,
            max,
        })
    }

    /// Reads a raw scan from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_raw(
        path: impl AsRef<Path>,
        dims: [u32; 3],
        sample_type: SampleType,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read volume {}", path.display()))?;
        let volume = Self::from_raw_bytes(&bytes, dims, sample_type)
            .with_context(|| format!("invalid volume {}", path.display()))?;
        log::info!(
            "Loaded {} ({:?}, {:?}): min {} max {}",
            path.display(),
            dims,
            sample_type,
            volume.min,
            volume.max
        );
        Ok(volume)
    }

    /// A synthetic dataset: a soft ball with a denser inner shell, centered in the grid.
    pub fn sphere(dims: [u32; 3]) -> anyhow::Result<Self> {
        let count = Self::voxel_count(dims)?;
        let [w, h, d] = dims;
        let mut data = Vec::with_capacity(count);

        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    let p = [
                        centered(x, w),
                        centered(y, h),
                        centered(z, d),
                    ];
                    let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
                    let ball = (1.0 - r).clamp(0.0, 1.0);
                    let shell = (1.0 - ((r - 0.5).abs() * 10.0)).clamp(0.0, 1.0);
                    let value = (0.6 * ball + 0.4 * shell).clamp(0.0, 1.0);
                    data.push((value * 255.0) as u8);
                }
            }
        }

        Ok(Self {
            dims,
            data,
            min: 0.0,
            max: 255.0,
        })
    }

    /// Normalized value of one voxel, `None` outside the grid.
    pub fn value_at(&self, x: u32, y: u32, z: u32) -> Option<u8> {
        let [w, h, d] = self.dims;
        if x >= w || y >= h || z >= d {
            return None;
        }
        let index = (z as usize * h as usize + y as usize) * w as usize + x as usize;
        self.data.get(index).copied()
    }
}

// Voxel center mapped to -1..1.
fn centered(i: u32, n: u32) -> f32 {
    ((i as f32 + 0.5) / n as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i32_bytes(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn remaps_range_onto_bytes() {
        let samples = [-100.0, 0.0, 100.0];
        let range = value_range(&samples).unwrap();
        assert_eq!(range, (-100.0, 100.0));
        assert_eq!(normalize(&samples, range), vec![0, 127, 255]);
    }

    #[test]
    fn constant_volume_is_all_zero() {
        let volume =
            Volume::from_raw_bytes(&i32_bytes(&[7; 8]), [2, 2, 2], SampleType::I32).unwrap();
        assert_eq!(volume.data, vec![0; 8]);
        assert_eq!((volume.min, volume.max), (7.0, 7.0));
    }

    #[test]
    fn rejects_short_input() {
        let err = Volume::from_raw_bytes(&i32_bytes(&[1, 2, 3]), [2, 2, 1], SampleType::I32)
            .unwrap_err();
        assert!(err.to_string().contains("need 16"));
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut bytes = i32_bytes(&[0, 10]);
        bytes.extend_from_slice(&[0xff; 3]);
        let volume = Volume::from_raw_bytes(&bytes, [2, 1, 1], SampleType::I32).unwrap();
        assert_eq!(volume.data, vec![0, 255]);
    }

    #[test]
    fn rejects_zero_dimension() {
        assert!(Volume::voxel_count([128, 0, 128]).is_err());
        assert_eq!(Volume::voxel_count([128, 128, 128]).unwrap(), 128 * 128 * 128);
    }

    #[test]
    fn decodes_each_sample_type() {
        assert_eq!(SampleType::I8.decode(&[0xff, 0x01]), vec![-1.0, 1.0]);
        assert_eq!(SampleType::U16.decode(&[0x00, 0x01]), vec![256.0]);
        assert_eq!(SampleType::I16.decode(&[0xfe, 0xff]), vec![-2.0]);
        assert_eq!(SampleType::F32.decode(&1.5f32.to_le_bytes()), vec![1.5]);
    }

    #[test]
    fn non_finite_samples_are_skipped() {
        let samples = [f32::NAN, 1.0, 3.0, f32::INFINITY];
        let range = value_range(&samples).unwrap();
        assert_eq!(range, (1.0, 3.0));
        assert_eq!(normalize(&samples, range), vec![0, 0, 255, 0]);
    }

    #[test]
    fn indexes_x_fastest() {
        let volume = Volume::from_raw_bytes(
            &i32_bytes(&[0, 1, 2, 3, 4, 5, 6, 255]),
            [2, 2, 2],
            SampleType::I32,
        )
        .unwrap();
        assert_eq!(volume.value_at(1, 0, 0), Some(1));
        assert_eq!(volume.value_at(0, 1, 0), Some(2));
        assert_eq!(volume.value_at(0, 0, 1), Some(4));
        assert_eq!(volume.value_at(1, 1, 1), Some(255));
        assert_eq!(volume.value_at(2, 0, 0), None);
    }

    #[test]
    fn sphere_is_densest_in_the_middle() {
        let volume = Volume::sphere([16, 16, 16]).unwrap();
        assert_eq!(volume.data.len(), 16 * 16 * 16);
        let corner = volume.value_at(0, 0, 0).unwrap();
        let center = volume.value_at(8, 8, 8).unwrap();
        assert!(center > corner);
        assert_eq!(corner, 0);
    }
}
