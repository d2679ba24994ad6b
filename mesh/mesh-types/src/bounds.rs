//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (AABB).
///
/// A non-empty box satisfies `min <= max` on every axis. The value
/// returned by [`Aabb::empty`] has inverted corners and acts as the
/// identity for [`Aabb::union`] and [`Aabb::expand_to_include`].
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
///
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0)));
/// assert_eq!(aabb.max_extent(), 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create a new AABB from two corners.
    ///
    /// The corners are sorted per axis, so the result is never inverted.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Create an empty (inverted) AABB.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let mut aabb = Aabb::empty();
    /// assert!(aabb.is_empty());
    ///
    /// aabb.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
    /// assert!(!aabb.is_empty());
    /// ```
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create an AABB enclosing every point of an iterator.
    ///
    /// Returns an empty AABB if the iterator is empty.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    /// Check if the AABB is empty (inverted on some axis).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Size along each axis.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the longest edge.
    #[inline]
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Index of the longest axis (0=X, 1=Y, 2=Z).
    ///
    /// Ties resolve to the lower axis index.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Check if the AABB contains a point. Boundary points are inside.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Check if `other` lies entirely within this box.
    #[must_use]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        other.is_empty() || (self.contains(&other.min) && self.contains(&other.max))
    }

    /// Compute the enclosing AABB of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Expand the AABB in place to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Squared distance from a point to the box, 0.0 inside.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let aabb = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
    /// assert_eq!(aabb.distance_squared(&Point3::new(3.0, 0.5, 0.5)), 4.0);
    /// ```
    #[must_use]
    pub fn distance_squared(&self, point: &Point3<f64>) -> f64 {
        let mut sum = 0.0;
        for axis in 0..3 {
            let v = point[axis];
            let d = if v < self.min[axis] {
                self.min[axis] - v
            } else if v > self.max[axis] {
                v - self.max[axis]
            } else {
                0.0
            };
            sum += d * d;
        }
        sum
    }

    /// Slab test of a ray against the box.
    ///
    /// `inv_direction` is the componentwise reciprocal of the ray direction
    /// (infinite components are fine). Returns the entry parameter clamped
    /// to zero when the ray hits the box at `t >= 0`.
    #[must_use]
    pub fn ray_entry(&self, origin: &Point3<f64>, inv_direction: &Vector3<f64>) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let t0 = (self.min[axis] - origin[axis]) * inv_direction[axis];
            let t1 = (self.max[axis] - origin[axis]) * inv_direction[axis];
            // NaN arises for a zero direction component with the origin on a
            // slab plane; treat that axis as non-constraining.
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            if !near.is_nan() {
                t_min = t_min.max(near);
            }
            if !far.is_nan() {
                t_max = t_max.min(far);
            }
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}
