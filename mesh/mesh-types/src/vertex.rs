//! Vertex type.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex.
///
/// Only the position matters for distance field generation. Normals,
/// colors and texture coordinates are dropped on import.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// Position in 3D space.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a vertex at a position.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Vertex, Point3};
    ///
    /// let v = Vertex::new(Point3::new(1.0, 2.0, 3.0));
    /// assert_eq!(v.position.x, 1.0);
    /// ```
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self { position }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.z, 3.0);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Check that every coordinate is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(coords: [f64; 3]) -> Self {
        Self::from_coords(coords[0], coords[1], coords[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_from_array() {
        let v = Vertex::from([1.0, 2.0, 3.0]);
        assert_eq!(v, Vertex::from_coords(1.0, 2.0, 3.0));
    }

    #[test]
    fn vertex_finiteness() {
        assert!(Vertex::from_coords(0.0, -1.0, 1e300).is_finite());
        assert!(!Vertex::from_coords(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vertex::from_coords(0.0, f64::INFINITY, 0.0).is_finite());
    }
}
