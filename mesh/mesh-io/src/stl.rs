//! STL (Stereolithography) file format support.
//!
//! Supports both ASCII and binary STL.
//!
//! # Format Detection
//!
//! - ASCII files start with "solid" (after optional whitespace) and have
//!   no NUL bytes in the first 80 bytes
//! - Binary files have an 80-byte header followed by the face count
//!
//! # Meshes per file
//!
//! A binary file is always one mesh. An ASCII file yields one mesh per
//! `solid ... endsolid` block, so a multi-solid file is reported as several
//! meshes and rejected downstream by the one-mesh-per-run rule.
//!
//! STL is a triangle soup; every loaded mesh is welded so that coincident
//! corners share a vertex.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use mesh_types::{IndexedMesh, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Load every mesh stored in an STL file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid STL.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let meshes = load_stl("model.stl").unwrap();
/// println!("Loaded {} mesh(es)", meshes.len());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<Vec<IndexedMesh>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_stl(&bytes)
}

/// Parse STL content held in memory.
///
/// # Errors
///
/// Returns an error if the content is not valid STL.
pub fn parse_stl(bytes: &[u8]) -> IoResult<Vec<IndexedMesh>> {
    if bytes.len() < 6 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }

    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    let looks_ascii = String::from_utf8_lossy(head).trim_start().starts_with("solid");

    let mut meshes = if looks_ascii && !head.contains(&0) {
        parse_stl_ascii(BufReader::new(bytes))?
    } else {
        vec![parse_stl_binary(bytes)?]
    };

    for mesh in &mut meshes {
        let merged = mesh.weld_identical();
        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            merged,
            "Welded STL triangle soup"
        );
    }
    Ok(meshes)
}

/// Parse a binary STL body.
fn parse_stl_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(IoError::InvalidHeader {
            expected: HEADER_SIZE + 4,
            got: bytes.len(),
        });
    }

    let face_count = u32::from_le_bytes([
        bytes[HEADER_SIZE],
        bytes[HEADER_SIZE + 1],
        bytes[HEADER_SIZE + 2],
        bytes[HEADER_SIZE + 3],
    ]);

    let body = &bytes[HEADER_SIZE + 4..];
    let complete = body.len() / TRIANGLE_SIZE;
    if complete < face_count as usize {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: complete < face_count, which is a u32
        return Err(IoError::InvalidFaceCount {
            expected: face_count,
            got: complete as u32,
        });
    }

    let mut mesh = IndexedMesh::with_capacity((face_count as usize) * 3, face_count as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(face_count as usize) {
        // Skip normal (12 bytes), read 3 vertices (36 bytes total)
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
        let base_idx = mesh.vertices.len() as u32;
        mesh.vertices.push(read_vertex(&record[12..24]));
        mesh.vertices.push(read_vertex(&record[24..36]));
        mesh.vertices.push(read_vertex(&record[36..48]));
        mesh.faces.push([base_idx, base_idx + 1, base_idx + 2]);
    }

    Ok(mesh)
}

/// Read a vertex from 12 bytes (3 little-endian f32s).
fn read_vertex(buf: &[u8]) -> Vertex {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Vertex::from_coords(f64::from(x), f64::from(y), f64::from(z))
}

/// Parse ASCII STL, one mesh per `solid` block.
fn parse_stl_ascii<R: BufRead>(reader: R) -> IoResult<Vec<IndexedMesh>> {
    let mut meshes = Vec::new();
    let mut current: Option<IndexedMesh> = None;
    let mut in_loop = false;
    let mut corners: Vec<Vertex> = Vec::with_capacity(3);

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "solid" => {
                if let Some(open) = current.replace(IndexedMesh::new()) {
                    // Missing endsolid; keep what was read.
                    meshes.push(open);
                }
            }
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                let mut coord = || -> IoResult<f64> {
                    parts
                        .next()
                        .ok_or_else(|| IoError::invalid_content("vertex line with fewer than 3 coordinates"))?
                        .parse::<f64>()
                        .map_err(IoError::from)
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                corners.push(Vertex::from_coords(x, y, z));
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                let mesh = current
                    .as_mut()
                    .ok_or_else(|| IoError::invalid_content("facet outside of a solid block"))?;
                if corners.len() != 3 {
                    return Err(IoError::invalid_content(format!(
                        "facet with {} vertices, expected 3",
                        corners.len()
                    )));
                }
                #[allow(clippy::cast_possible_truncation)]
                // Truncation: mesh indices are u32, meshes with >4B vertices unsupported
                let base_idx = mesh.vertices.len() as u32;
                mesh.vertices.append(&mut corners);
                mesh.faces.push([base_idx, base_idx + 1, base_idx + 2]);
            }
            "endsolid" => {
                if let Some(done) = current.take() {
                    meshes.push(done);
                }
            }
            _ => {}
        }
    }

    if let Some(open) = current.take() {
        meshes.push(open);
    }
    if meshes.is_empty() {
        return Err(IoError::invalid_content("ASCII STL without a solid block"));
    }
    Ok(meshes)
}

/// Save a mesh to an STL file.
///
/// # Errors
///
/// Returns an error if the file cannot be written or a face references a
/// missing vertex.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    if binary {
        save_stl_binary(mesh, writer)
    } else {
        save_stl_ascii(mesh, writer)
    }
}

fn resolved_triangles(mesh: &IndexedMesh) -> IoResult<Vec<mesh_types::Triangle>> {
    (0..mesh.face_count())
        .map(|i| {
            mesh.triangle(i)
                .ok_or_else(|| IoError::invalid_content(format!("face {i} references a missing vertex")))
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
// Truncation: STL stores f32 coordinates
fn save_stl_binary<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    let mut header = [b' '; HEADER_SIZE];
    let text = b"Binary STL written by mesh-io";
    header[..text.len()].copy_from_slice(text);
    writer.write_all(&header)?;

    let triangles = resolved_triangles(mesh)?;
    writer.write_all(&(triangles.len() as u32).to_le_bytes())?;

    for tri in &triangles {
        let normal = tri.normal_unnormalized().try_normalize(f64::EPSILON).unwrap_or_default();
        for value in normal.iter().chain(tri.v0.iter()).chain(tri.v1.iter()).chain(tri.v2.iter()) {
            writer.write_all(&(*value as f32).to_le_bytes())?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn save_stl_ascii<W: Write>(mesh: &IndexedMesh, mut writer: W) -> IoResult<()> {
    writeln!(writer, "solid mesh")?;
    for tri in resolved_triangles(mesh)? {
        let n = tri.normal_unnormalized().try_normalize(f64::EPSILON).unwrap_or_default();
        writeln!(writer, "  facet normal {:.6e} {:.6e} {:.6e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for v in [tri.v0, tri.v1, tri.v2] {
            writeln!(writer, "      vertex {:.9e} {:.9e} {:.9e}", v.x, v.y, v.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid mesh")?;
    writer.flush()?;
    Ok(())
}
