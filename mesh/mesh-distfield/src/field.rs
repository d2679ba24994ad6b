//! The quantized distance volume and its file format.
//!
//! A field file is exactly `N³` bytes with no header, in the order
//! `index = y*N*N + z*N + x`. The resolution is not stored and must be
//! supplied when reading.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{FieldError, FieldResult};

/// Quantized value for samples on or inside the surface.
pub const SOLID: u8 = 0;

/// Quantized value for samples at or beyond distance 1.0.
pub const SATURATED: u8 = 255;

/// `N×N×N` unsigned 8-bit distances over the unit cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceField {
    resolution: usize,
    data: Vec<u8>,
}

impl DistanceField {
    /// Wrap a byte payload of length `resolution³`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::FieldSizeMismatch`] when the length is wrong.
    pub fn from_bytes(resolution: usize, data: Vec<u8>) -> FieldResult<Self> {
        let expected = voxel_count(resolution)?;
        if data.len() != expected {
            return Err(FieldError::FieldSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { resolution, data })
    }

    /// Wrap bytes whose length the caller guarantees to be `resolution³`.
    pub(crate) const fn from_raw(resolution: usize, data: Vec<u8>) -> Self {
        Self { resolution, data }
    }

    /// A field with every voxel set to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidConfig`] if `resolution³` overflows.
    pub fn filled(resolution: usize, value: u8) -> FieldResult<Self> {
        let count = voxel_count(resolution)?;
        Ok(Self {
            resolution,
            data: vec![value; count],
        })
    }

    /// Samples per axis.
    #[must_use]
    pub const fn resolution(&self) -> usize {
        self.resolution
    }

    /// Total number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for a zero-resolution field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes in file order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the field, returning its bytes in file order.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Offset of voxel `(x, y, z)` in file order.
    #[must_use]
    pub const fn voxel_index(&self, x: usize, y: usize, z: usize) -> usize {
        let n = self.resolution;
        y * n * n + z * n + x
    }

    /// Voxel value, `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<u8> {
        let n = self.resolution;
        if x >= n || y >= n || z >= n {
            return None;
        }
        Some(self.data[self.voxel_index(x, y, z)])
    }

    /// Byte histogram summary.
    #[must_use]
    pub fn summary(&self) -> FieldSummary {
        let mut summary = FieldSummary {
            resolution: self.resolution,
            min: u8::MAX,
            max: u8::MIN,
            ..FieldSummary::default()
        };
        for &value in &self.data {
            summary.min = summary.min.min(value);
            summary.max = summary.max.max(value);
            match value {
                SOLID => summary.solid += 1,
                SATURATED => summary.saturated += 1,
                _ => {}
            }
        }
        if self.data.is_empty() {
            summary.min = 0;
        }
        summary
    }

    /// Write the field to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if the file cannot be created or written.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> FieldResult<()> {
        StagedOutput::create(path)?.commit(self)
    }

    /// Read a field of the given resolution from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if the file cannot be read and
    /// [`FieldError::FieldSizeMismatch`] if its length is not `resolution³`.
    pub fn read_from<P: AsRef<Path>>(path: P, resolution: usize) -> FieldResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FieldError::io(path, e))?;
        debug!(path = %path.display(), bytes = data.len(), "Read field file");
        Self::from_bytes(resolution, data)
    }
}

fn voxel_count(resolution: usize) -> FieldResult<usize> {
    resolution.checked_pow(3).ok_or_else(|| {
        FieldError::invalid_config(format!("resolution {resolution} overflows the voxel count"))
    })
}

/// Value counts over a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSummary {
    /// Samples per axis.
    pub resolution: usize,
    /// Voxels holding [`SOLID`].
    pub solid: usize,
    /// Voxels holding [`SATURATED`].
    pub saturated: usize,
    /// Smallest byte.
    pub min: u8,
    /// Largest byte.
    pub max: u8,
}

/// An output file reserved before generation and published after it.
///
/// The bytes go to a temporary file beside the destination, which is
/// renamed over the destination only on [`commit`](Self::commit). Dropping
/// a staged output without committing deletes the temporary file and
/// leaves the destination untouched.
#[derive(Debug)]
pub struct StagedOutput {
    destination: PathBuf,
    file: NamedTempFile,
}

impl StagedOutput {
    /// Reserve a temporary file in the destination's directory.
    ///
    /// An existing destination must be a regular file that can be opened
    /// for writing; it is not truncated here.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if the destination is a directory or
    /// another non-file entry, if an existing destination is not writable,
    /// or if the directory is missing or not writable.
    pub fn create<P: AsRef<Path>>(destination: P) -> FieldResult<Self> {
        let destination = destination.as_ref().to_path_buf();
        check_destination(&destination).map_err(|e| FieldError::io(&destination, e))?;
        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = NamedTempFile::new_in(&directory).map_err(|e| FieldError::io(&destination, e))?;
        debug!(
            destination = %destination.display(),
            staging = %file.path().display(),
            "Staged output file"
        );
        Ok(Self { destination, file })
    }

    /// Final path the field will be published to.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write `field` and move it into place.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if writing, syncing or renaming fails.
    pub fn commit(mut self, field: &DistanceField) -> FieldResult<()> {
        let destination = self.destination;
        self.file
            .write_all(field.as_bytes())
            .and_then(|()| self.file.as_file().sync_all())
            .map_err(|e| FieldError::io(&destination, e))?;
        self.file
            .persist(&destination)
            .map_err(|e| FieldError::io(&destination, e.error))?;
        info!(
            path = %destination.display(),
            bytes = field.len(),
            "Wrote distance field"
        );
        Ok(())
    }
}

fn check_destination(destination: &Path) -> io::Result<()> {
    let metadata = match std::fs::metadata(destination) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination exists and is not a regular file",
        ));
    }
    OpenOptions::new().append(true).open(destination).map(drop)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_order_is_y_z_x() {
        let data: Vec<u8> = (0..27).collect();
        let field = DistanceField::from_bytes(3, data).unwrap();
        assert_eq!(field.voxel_index(1, 0, 0), 1);
        assert_eq!(field.voxel_index(0, 0, 1), 3);
        assert_eq!(field.voxel_index(0, 1, 0), 9);
        assert_eq!(field.get(2, 2, 2), Some(26));
        assert_eq!(field.get(1, 2, 0), Some(19));
        assert_eq!(field.get(3, 0, 0), None);
    }

    #[test]
    fn size_mismatch() {
        assert!(matches!(
            DistanceField::from_bytes(4, vec![0; 63]),
            Err(FieldError::FieldSizeMismatch {
                expected: 64,
                got: 63
            })
        ));
    }

    #[test]
    fn summary_counts() {
        let mut data = vec![SATURATED; 8];
        data[0] = SOLID;
        data[1] = SOLID;
        data[2] = 17;
        let field = DistanceField::from_bytes(2, data).unwrap();
        let summary = field.summary();
        assert_eq!(summary.solid, 2);
        assert_eq!(summary.saturated, 5);
        assert_eq!(summary.min, 0);
        assert_eq!(summary.max, 255);
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.bin");
        let field = DistanceField::from_bytes(2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        field.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), 8);
        assert_eq!(DistanceField::read_from(&path, 2).unwrap(), field);
        assert!(matches!(
            DistanceField::read_from(&path, 3),
            Err(FieldError::FieldSizeMismatch { .. })
        ));
    }

    #[test]
    fn abandoned_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.bin");
        let staged = StagedOutput::create(&path).unwrap();
        assert_eq!(staged.destination(), path.as_path());
        drop(staged);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_fails_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("field.bin");
        assert!(matches!(
            StagedOutput::create(&path),
            Err(FieldError::Io { .. })
        ));
    }

    #[test]
    fn directory_destination_fails_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("taken");
        std::fs::create_dir(&target).unwrap();
        assert!(matches!(
            StagedOutput::create(&target),
            Err(FieldError::Io { .. })
        ));
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn existing_file_is_kept_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.bin");
        std::fs::write(&path, [9_u8; 3]).unwrap();

        let staged = StagedOutput::create(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![9; 3]);

        let field = DistanceField::filled(2, 7).unwrap();
        staged.commit(&field).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![7; 8]);
    }
}
