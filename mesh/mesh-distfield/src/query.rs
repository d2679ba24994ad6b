//! Traversal queries on a [`SpatialIndex`].

use mesh_types::{IndexedMesh, Point3, Vector3};

use crate::bvh::{BvhNode, SpatialIndex};

/// Determinant threshold below which a ray is treated as parallel to a triangle.
const RAY_PARALLEL_EPSILON: f64 = 1e-12;

/// Closest surface point found by [`SpatialIndex::nearest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Face index in the source mesh.
    pub face: u32,
    /// Closest point on that face.
    pub point: Point3<f64>,
    /// Squared distance from the query point.
    pub distance_squared: f64,
}

impl SpatialIndex {
    /// Exact nearest point on the mesh surface, `None` for an empty index.
    ///
    /// Nodes are visited nearer child first; any node whose box is no
    /// closer than the best triangle found so far is pruned.
    #[must_use]
    pub fn nearest(&self, point: &Point3<f64>) -> Option<Nearest> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best_d2 = f64::INFINITY;
        let mut best_slot = 0_usize;
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.bounds().distance_squared(point) >= best_d2 {
                continue;
            }
            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    let run = start as usize..(start + count) as usize;
                    for slot in run {
                        let d2 = self.triangles[slot].distance_squared(point);
                        if d2 < best_d2 {
                            best_d2 = d2;
                            best_slot = slot;
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    let dl = self.nodes[left as usize].bounds().distance_squared(point);
                    let dr = self.nodes[right as usize].bounds().distance_squared(point);
                    let (near, far) = if dl <= dr { (left, right) } else { (right, left) };
                    stack.push(far);
                    stack.push(near);
                }
            }
        }

        let triangle = &self.triangles[best_slot];
        Some(Nearest {
            face: self.faces[best_slot],
            point: triangle.closest_point(point),
            distance_squared: best_d2,
        })
    }

    /// Squared distance to the nearest triangle.
    ///
    /// Infinite for an empty index.
    #[must_use]
    pub fn nearest_squared_distance(&self, point: &Point3<f64>) -> f64 {
        self.nearest(point)
            .map_or(f64::INFINITY, |nearest| nearest.distance_squared)
    }

    /// Report every triangle crossed by the ray `origin + t * direction`, `t >= 0`.
    ///
    /// `visitor` receives the source face index and the ray parameter of
    /// each hit, in traversal order (not sorted by `t`).
    pub fn ray_hits<F>(&self, origin: &Point3<f64>, direction: &Vector3<f64>, mut visitor: F)
    where
        F: FnMut(u32, f64),
    {
        if self.nodes.is_empty() {
            return;
        }

        let inv_direction = direction.map(|c| 1.0 / c);
        let mut stack: Vec<u32> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.bounds().ray_entry(origin, &inv_direction).is_none() {
                continue;
            }
            match *node {
                BvhNode::Leaf { start, count, .. } => {
                    for slot in start as usize..(start + count) as usize {
                        if let Some(t) =
                            self.triangles[slot].ray_intersect(origin, direction, RAY_PARALLEL_EPSILON)
                        {
                            visitor(self.faces[slot], t);
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }
}

/// Squared distance from `point` to the nearest face by exhaustive scan.
///
/// O(T); reference for checking the indexed query.
#[must_use]
pub fn brute_force_squared_distance(mesh: &IndexedMesh, point: &Point3<f64>) -> f64 {
    mesh.triangles()
        .map(|triangle| triangle.distance_squared(point))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::axis_aligned_box;

    fn cube() -> IndexedMesh {
        axis_aligned_box(Point3::new(0.1, 0.1, 0.1), Point3::new(0.9, 0.9, 0.9))
    }

    #[test]
    fn nearest_outside_face() {
        let index = SpatialIndex::build(&cube(), 2);
        let nearest = index.nearest(&Point3::new(0.5, 0.5, 1.2)).unwrap();
        assert_relative_eq!(nearest.distance_squared, 0.09, epsilon = 1e-12);
        assert_relative_eq!(nearest.point.z, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn nearest_to_corner() {
        let index = SpatialIndex::build(&cube(), 1);
        let d2 = index.nearest_squared_distance(&Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(d2, 0.03, epsilon = 1e-12);
    }

    #[test]
    fn nearest_from_inside() {
        let index = SpatialIndex::build(&cube(), 4);
        let d2 = index.nearest_squared_distance(&Point3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(d2, 0.16, epsilon = 1e-12);
    }

    #[test]
    fn matches_brute_force_on_grid() {
        let mesh = cube();
        let index = SpatialIndex::build(&mesh, 1);
        for i in 0..6 {
            for j in 0..6 {
                for k in 0..6 {
                    let p = Point3::new(
                        f64::from(i) * 0.25 - 0.2,
                        f64::from(j) * 0.25 - 0.2,
                        f64::from(k) * 0.25 - 0.2,
                    );
                    assert_relative_eq!(
                        index.nearest_squared_distance(&p),
                        brute_force_squared_distance(&mesh, &p),
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn empty_index_has_no_nearest() {
        let index = SpatialIndex::build(&IndexedMesh::new(), 4);
        assert!(index.nearest(&Point3::origin()).is_none());
        assert!(index.nearest_squared_distance(&Point3::origin()).is_infinite());
    }

    #[test]
    fn ray_hits_report_crossings() {
        let index = SpatialIndex::build(&cube(), 2);
        let mut hits = Vec::new();
        index.ray_hits(
            &Point3::new(0.5, 0.43, 0.37),
            &Vector3::new(1.0, 0.0, 0.0),
            |face, t| hits.push((face, t)),
        );
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0].1, 0.4, epsilon = 1e-12);

        hits.clear();
        index.ray_hits(
            &Point3::new(-1.0, 0.43, 0.37),
            &Vector3::new(1.0, 0.0, 0.0),
            |face, t| hits.push((face, t)),
        );
        let mut ts: Vec<f64> = hits.iter().map(|h| h.1).collect();
        ts.sort_by(f64::total_cmp);
        assert_eq!(ts.len(), 2);
        assert_relative_eq!(ts[0], 1.1, epsilon = 1e-12);
        assert_relative_eq!(ts[1], 1.9, epsilon = 1e-12);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let index = SpatialIndex::build(&cube(), 2);
        let mut count = 0;
        index.ray_hits(
            &Point3::new(2.0, 0.5, 0.5),
            &Vector3::new(1.0, 0.0, 0.0),
            |_, _| count += 1,
        );
        assert_eq!(count, 0);
    }
}
