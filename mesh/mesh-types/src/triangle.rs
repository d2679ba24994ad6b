//! Triangle type and its point and ray queries.

use nalgebra::{Point3, Vector3};

use crate::Aabb;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle with concrete vertex positions.
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// assert!((tri.distance_squared(&Point3::new(0.25, 0.25, 2.0)) - 4.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3<f64>,
    /// Second vertex.
    pub v1: Point3<f64>,
    /// Third vertex.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal (magnitude is twice the area).
    #[inline]
    #[must_use]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Centroid (average of the three vertices).
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Tight bounding box.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points([&self.v0, &self.v1, &self.v2])
    }

    /// Closest point on the triangle to `point`.
    ///
    /// Voronoi-region walk from "Real-Time Collision Detection" (Ericson):
    /// vertex regions, then edge regions, then the face interior.
    #[must_use]
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let (a, b, c) = (self.v0, self.v1, self.v2);
        let ab = b - a;
        let ac = c - a;
        let ap = point - a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = point - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = point - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom.abs() < f64::MIN_POSITIVE {
            // Zero-area triangle that slipped past every region test.
            return a;
        }
        let v = vb / denom;
        let w = vc / denom;
        a + ab * v + ac * w
    }

    /// Squared distance from `point` to the closest point on the triangle.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, point: &Point3<f64>) -> f64 {
        (self.closest_point(point) - point).norm_squared()
    }

    /// Möller–Trumbore ray intersection.
    ///
    /// Returns the ray parameter `t >= 0` of the hit, or `None` when the ray
    /// misses, points away, or is parallel to the plane within `epsilon`.
    #[must_use]
    pub fn ray_intersect(
        &self,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        epsilon: f64,
    ) -> Option<f64> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = direction.cross(&edge2);
        let a = edge1.dot(&h);

        if a.abs() < epsilon {
            return None;
        }

        let f = 1.0 / a;
        let s = origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t >= 0.0).then_some(t)
    }

    /// Signed solid angle subtended by the triangle at `point`.
    ///
    /// Van Oosterom–Strackee formula. Positive when the triangle is wound
    /// counter-clockwise as seen from `point`. Summed over a closed,
    /// outward-wound surface this is `4π` inside and `0` outside.
    #[must_use]
    pub fn solid_angle(&self, point: &Point3<f64>) -> f64 {
        let a = self.v0 - point;
        let b = self.v1 - point;
        let c = self.v2 - point;
        let la = a.norm();
        let lb = b.norm();
        let lc = c.norm();
        if la == 0.0 || lb == 0.0 || lc == 0.0 {
            return 0.0;
        }
        let numerator = a.dot(&b.cross(&c));
        let denominator = la * lb * lc + a.dot(&b) * lc + b.dot(&c) * la + c.dot(&a) * lb;
        2.0 * numerator.atan2(denominator)
    }
}
