//! Indexed triangle mesh.

use hashbrown::HashMap;
use nalgebra::Point3;

use crate::{Aabb, Triangle, Vertex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Vertices and faces are stored separately, with faces referencing
/// vertices by index. A well-formed mesh has every index below
/// `vertices.len()`; [`IndexedMesh::first_invalid_face`] reports the
/// first violation.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let vertices = vec![
///     Vertex::from_coords(0.0, 0.0, 0.0),
///     Vertex::from_coords(1.0, 0.0, 0.0),
///     Vertex::from_coords(0.0, 1.0, 0.0),
/// ];
/// let mesh = IndexedMesh::from_parts(vertices, vec![[0, 1, 2]]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// assert!(mesh.first_invalid_face().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh is empty when it has no vertices or no faces.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Index of the first face referencing a missing vertex, if any.
    #[must_use]
    pub fn first_invalid_face(&self) -> Option<usize> {
        let count = self.vertices.len();
        self.faces
            .iter()
            .position(|face| face.iter().any(|&i| i as usize >= count))
    }

    /// Resolve a face to its vertex positions.
    ///
    /// Returns `None` if the face index or any of its vertex indices is
    /// out of range.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle::new(
            self.vertices.get(i0 as usize)?.position,
            self.vertices.get(i1 as usize)?.position,
            self.vertices.get(i2 as usize)?.position,
        ))
    }

    /// Iterate over all faces with resolved vertex positions.
    ///
    /// Faces with out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.faces.len()).filter_map(|i| self.triangle(i))
    }

    /// Bounding box of all vertices (empty for a mesh without vertices).
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Apply a transform to every vertex position.
    #[must_use]
    pub fn map_positions(&self, f: impl Fn(&Point3<f64>) -> Point3<f64>) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex::new(f(&v.position)))
                .collect(),
            faces: self.faces.clone(),
        }
    }

    /// Merge vertices with bit-identical positions.
    ///
    /// Triangle-soup formats (STL) store every corner separately; welding
    /// restores shared vertices. Face indices are remapped and the first
    /// occurrence of each position is kept. Returns the number of vertices
    /// removed.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Vertex};
    ///
    /// let mut mesh = IndexedMesh::from_parts(
    ///     vec![
    ///         Vertex::from_coords(0.0, 0.0, 0.0),
    ///         Vertex::from_coords(1.0, 0.0, 0.0),
    ///         Vertex::from_coords(0.0, 1.0, 0.0),
    ///         Vertex::from_coords(1.0, 0.0, 0.0),
    ///     ],
    ///     vec![[0, 1, 2], [3, 2, 1]],
    /// );
    /// assert_eq!(mesh.weld_identical(), 1);
    /// assert_eq!(mesh.faces[1], [1, 2, 1]);
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
    pub fn weld_identical(&mut self) -> usize {
        let mut first_seen: HashMap<[u64; 3], u32> = HashMap::with_capacity(self.vertices.len());
        let mut remap = Vec::with_capacity(self.vertices.len());
        let mut kept = Vec::with_capacity(self.vertices.len());

        for vertex in &self.vertices {
            let p = vertex.position;
            // +0.0 so that -0.0 and 0.0 share a key.
            let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
            let index = *first_seen.entry(key).or_insert_with(|| {
                kept.push(*vertex);
                (kept.len() - 1) as u32
            });
            remap.push(index);
        }

        let removed = self.vertices.len() - kept.len();
        if removed == 0 {
            return 0;
        }

        for face in &mut self.faces {
            for index in face.iter_mut() {
                if let Some(&mapped) = remap.get(*index as usize) {
                    *index = mapped;
                }
            }
        }
        self.vertices = kept;
        removed
    }
}

/// Closed box mesh spanning `min..max` (8 vertices, 12 outward-wound faces).
///
/// # Example
///
/// ```
/// use mesh_types::{axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::new(0.1, 0.1, 0.1), Point3::new(0.9, 0.9, 0.9));
/// assert_eq!(cube.vertex_count(), 8);
/// assert_eq!(cube.face_count(), 12);
/// ```
#[must_use]
pub fn axis_aligned_box(min: Point3<f64>, max: Point3<f64>) -> IndexedMesh {
    let (a, b) = (min, max);
    let vertices = vec![
        Vertex::from_coords(a.x, a.y, a.z), // 0
        Vertex::from_coords(b.x, a.y, a.z), // 1
        Vertex::from_coords(b.x, b.y, a.z), // 2
        Vertex::from_coords(a.x, b.y, a.z), // 3
        Vertex::from_coords(a.x, a.y, b.z), // 4
        Vertex::from_coords(b.x, a.y, b.z), // 5
        Vertex::from_coords(b.x, b.y, b.z), // 6
        Vertex::from_coords(a.x, b.y, b.z), // 7
    ];
    let faces = vec![
        // -Z
        [0, 2, 1],
        [0, 3, 2],
        // +Z
        [4, 5, 6],
        [4, 6, 7],
        // -Y
        [0, 1, 5],
        [0, 5, 4],
        // +Y
        [3, 7, 6],
        [3, 6, 2],
        // -X
        [0, 4, 7],
        [0, 7, 3],
        // +X
        [1, 2, 6],
        [1, 6, 5],
    ];
    IndexedMesh::from_parts(vertices, faces)
}
