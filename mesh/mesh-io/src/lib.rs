//! Mesh import for distance field generation.
//!
//! Loads triangle meshes from:
//!
//! - **STL** (Stereolithography) - Binary and ASCII, one mesh per solid
//! - **OBJ** (Wavefront) - via `tobj`, one mesh per object or group
//!
//! Files can hold several meshes, so every loader returns a `Vec`. Whether
//! a given count is acceptable is the caller's decision; the generator
//! requires exactly one.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::load_meshes;
//!
//! // Format detected from the .obj extension
//! let meshes = load_meshes("armadillo.obj").unwrap();
//! println!("{} mesh(es), {} faces in the first", meshes.len(), meshes[0].face_count());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod obj;
mod stl;

pub use error::{IoError, IoResult};
pub use obj::{load_obj, parse_obj};
pub use stl::{load_stl, parse_stl, save_stl};

use std::path::Path;

use mesh_types::IndexedMesh;
use tracing::info;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// STL (Stereolithography), binary or ASCII.
    Stl,
    /// OBJ (Wavefront), ASCII.
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension (case-insensitive).
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    /// Canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
        }
    }
}

/// Load every mesh in a file, detecting format from the extension.
///
/// # Errors
///
/// Returns an error if:
/// - The file format cannot be determined from the extension
/// - The file cannot be read
/// - The file content is invalid for the detected format
pub fn load_meshes<P: AsRef<Path>>(path: P) -> IoResult<Vec<IndexedMesh>> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path).ok_or_else(|| IoError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    let meshes = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
    };

    info!(
        path = %path.display(),
        format = format.extension(),
        meshes = meshes.len(),
        faces = meshes.iter().map(IndexedMesh::face_count).sum::<usize>(),
        "Loaded mesh file"
    );
    Ok(meshes)
}
