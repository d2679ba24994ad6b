//! Wavefront OBJ import.
//!
//! Parsing is delegated to `tobj`. Polygons are triangulated and each `o`
//! or `g` group becomes its own mesh. Only positions are kept; faces index
//! the position array directly.

use std::path::Path;

use mesh_types::{IndexedMesh, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load every mesh (object or group) stored in an OBJ file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed, or if a face
/// references a missing position.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_obj;
///
/// let meshes = load_obj("bunny.obj").unwrap();
/// assert_eq!(meshes.len(), 1);
/// ```
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<Vec<IndexedMesh>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    // Materials are irrelevant for geometry; a missing .mtl is not an error.
    let (models, _materials) = tobj::load_obj(path, &load_options())?;
    models.into_iter().map(|model| convert_model(model.name, &model.mesh)).collect()
}

/// Parse OBJ content held in memory.
///
/// # Errors
///
/// Returns an error if the content cannot be parsed.
pub fn parse_obj(text: &str) -> IoResult<Vec<IndexedMesh>> {
    let mut reader = std::io::BufReader::new(text.as_bytes());
    // No material library is reachable from a string; any `mtllib` line is ignored.
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    models.into_iter().map(|model| convert_model(model.name, &model.mesh)).collect()
}

fn convert_model(name: String, mesh: &tobj::Mesh) -> IoResult<IndexedMesh> {
    let vertices: Vec<Vertex> = mesh
        .positions
        .chunks_exact(3)
        .map(|c| Vertex::from_coords(f64::from(c[0]), f64::from(c[1]), f64::from(c[2])))
        .collect();

    let faces: Vec<[u32; 3]> = mesh
        .indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let result = IndexedMesh::from_parts(vertices, faces);
    if let Some(face) = result.first_invalid_face() {
        return Err(IoError::invalid_content(format!(
            "object '{name}': face {face} references a missing vertex"
        )));
    }

    debug!(
        object = %name,
        vertices = result.vertex_count(),
        faces = result.face_count(),
        "Imported OBJ object"
    );
    Ok(result)
}
