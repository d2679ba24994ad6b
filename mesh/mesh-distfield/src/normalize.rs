//! Rescaling a mesh into the unit sampling cube.
//!
//! The largest axis of the bounding box is mapped to [`FILL_FRACTION`] of
//! the cube and the box center to `(0.5, 0.5, 0.5)`, leaving a margin on
//! every side so that the outside of the surface is sampled too.

use mesh_types::{IndexedMesh, Point3, Vector3};
use tracing::debug;

use crate::error::{FieldError, FieldResult};

/// Fraction of the unit cube occupied by the largest mesh extent.
pub const FILL_FRACTION: f64 = 0.8;

/// Affine map between model space and the unit sampling cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    /// Uniform scale from model units to normalized units.
    pub scale: f64,
    /// Bounding box center in model space.
    pub center: Point3<f64>,
}

impl Normalization {
    /// Map a model space point into the sampling cube.
    #[must_use]
    pub fn to_normalized(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from((point - self.center) * self.scale) + Vector3::repeat(0.5)
    }

    /// Map a sampling cube point back into model space.
    #[must_use]
    pub fn to_model(&self, point: &Point3<f64>) -> Point3<f64> {
        self.center + (point - Point3::new(0.5, 0.5, 0.5)) / self.scale
    }

    /// Convert a normalized distance into model units.
    #[must_use]
    pub fn model_distance(&self, normalized: f64) -> f64 {
        normalized / self.scale
    }
}

/// Produce a copy of `mesh` fitted into the unit cube.
///
/// Topology is unchanged; only vertex positions are transformed.
///
/// # Errors
///
/// Returns [`FieldError::InvalidMesh`] if the mesh has no vertices or no
/// faces, if a face references a missing vertex, if a coordinate is not
/// finite, or if every vertex coincides.
///
/// # Example
///
/// ```
/// use mesh_distfield::normalize_mesh;
/// use mesh_types::{axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::new(-5.0, 0.0, 0.0), Point3::new(5.0, 2.0, 2.0));
/// let (unit, norm) = normalize_mesh(&cube).unwrap();
///
/// assert!((unit.bounds().max_extent() - 0.8).abs() < 1e-12);
/// assert!((norm.scale - 0.08).abs() < 1e-12);
/// ```
pub fn normalize_mesh(mesh: &IndexedMesh) -> FieldResult<(IndexedMesh, Normalization)> {
    if mesh.vertices.is_empty() {
        return Err(FieldError::invalid_mesh("mesh has no vertices"));
    }
    if mesh.faces.is_empty() {
        return Err(FieldError::invalid_mesh("mesh has no faces"));
    }
    if let Some(face) = mesh.first_invalid_face() {
        return Err(FieldError::invalid_mesh(format!(
            "face {face} references a vertex index out of range"
        )));
    }
    if let Some(index) = mesh.vertices.iter().position(|v| !v.is_finite()) {
        return Err(FieldError::invalid_mesh(format!(
            "vertex {index} has a non-finite coordinate"
        )));
    }

    let bounds = mesh.bounds();
    let extent = bounds.max_extent();
    if extent <= 0.0 {
        return Err(FieldError::invalid_mesh("all vertices coincide"));
    }

    let normalization = Normalization {
        scale: FILL_FRACTION / extent,
        center: bounds.center(),
    };
    debug!(
        scale = normalization.scale,
        center_x = normalization.center.x,
        center_y = normalization.center.y,
        center_z = normalization.center.z,
        extent,
        "Normalized mesh into unit cube"
    );

    let normalized = mesh.map_positions(|p| normalization.to_normalized(p));
    Ok((normalized, normalization))
}
