//! Two-dimensional atlas layout of a distance field.
//!
//! The atlas is a single-channel image `N·N` texels wide and `N` tall.
//! Slice `z` occupies columns `z·N .. (z+1)·N` over the full height, so
//! voxel `(x, y, z)` lands at column `z·N + x`, row `y`. Read row-major,
//! that is the same byte sequence as the field file, which is why a
//! renderer can upload the file unchanged.

use crate::error::{FieldError, FieldResult};
use crate::field::DistanceField;

/// A distance field laid out as a slice atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atlas {
    resolution: usize,
    texels: Vec<u8>,
}

impl Atlas {
    /// Lay out `field` as an atlas.
    #[must_use]
    pub fn pack(field: &DistanceField) -> Self {
        let n = field.resolution();
        let width = n * n;
        let mut texels = vec![0_u8; field.len()];
        for y in 0..n {
            for z in 0..n {
                let row_start = y * width + z * n;
                let voxel_start = field.voxel_index(0, y, z);
                texels[row_start..row_start + n]
                    .copy_from_slice(&field.as_bytes()[voxel_start..voxel_start + n]);
            }
        }
        Self {
            resolution: n,
            texels,
        }
    }

    /// Recover the volume from the atlas.
    #[must_use]
    pub fn unpack(&self) -> DistanceField {
        let n = self.resolution;
        let mut data = vec![0_u8; self.texels.len()];
        for y in 0..n {
            for z in 0..n {
                for x in 0..n {
                    data[y * n * n + z * n + x] = self.slice_texel(x, y, z);
                }
            }
        }
        DistanceField::from_raw(n, data)
    }

    /// Wrap raw atlas bytes, such as a field file read from disk.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::FieldSizeMismatch`] when the length is not `resolution³`.
    pub fn from_bytes(resolution: usize, texels: Vec<u8>) -> FieldResult<Self> {
        let expected = resolution.checked_pow(3).ok_or_else(|| {
            FieldError::invalid_config(format!("resolution {resolution} overflows the texel count"))
        })?;
        if texels.len() != expected {
            return Err(FieldError::FieldSizeMismatch {
                expected,
                got: texels.len(),
            });
        }
        Ok(Self { resolution, texels })
    }

    /// Samples per axis of the underlying volume.
    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Image width in texels (`N·N`).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.resolution * self.resolution
    }

    /// Image height in texels (`N`).
    #[must_use]
    pub const fn height(&self) -> usize {
        self.resolution
    }

    /// Texel at `(column, row)`. Panics outside the image.
    #[must_use]
    pub fn texel(&self, column: usize, row: usize) -> u8 {
        self.texels[row * self.width() + column]
    }

    /// Texel holding voxel `(x, y, z)`.
    #[must_use]
    pub fn slice_texel(&self, x: usize, y: usize, z: usize) -> u8 {
        self.texel(z * self.resolution + x, y)
    }

    /// Row-major texel bytes, top row first.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.texels
    }
}
