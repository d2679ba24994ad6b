//! Bounding volume hierarchy over mesh triangles.
//!
//! Nodes live in a flat arena and refer to each other by `u32` index.
//! Triangles are copied out of the mesh and reordered so that every leaf
//! covers a contiguous run of [`SpatialIndex::triangles`].
//!
//! Traversal (nearest distance and ray hits) is in [`crate::query`].

use mesh_types::{Aabb, IndexedMesh, Point3, Triangle};
use rayon::prelude::*;
use tracing::debug;

/// A node of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Terminal node covering `triangles[start..start + count]`.
    Leaf {
        /// Bounds of every triangle in the leaf.
        bounds: Aabb,
        /// First triangle of the run.
        start: u32,
        /// Number of triangles in the run.
        count: u32,
    },
    /// Interior node with exactly two children.
    Branch {
        /// Bounds of both children.
        bounds: Aabb,
        /// Arena index of the first child.
        left: u32,
        /// Arena index of the second child.
        right: u32,
    },
}

impl BvhNode {
    /// Bounding box of this node.
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Branch { bounds, .. } => bounds,
        }
    }
}

/// Per-face data gathered before the tree is built.
#[derive(Debug, Clone, Copy)]
struct Primitive {
    face: u32,
    triangle: Triangle,
    bounds: Aabb,
    centroid: Point3<f64>,
}

/// Immutable nearest-triangle acceleration structure.
///
/// Built once over a normalized mesh and then shared read-only by the
/// sampler threads.
///
/// # Example
///
/// ```
/// use mesh_distfield::SpatialIndex;
/// use mesh_types::{axis_aligned_box, Point3};
///
/// let cube = axis_aligned_box(Point3::new(0.1, 0.1, 0.1), Point3::new(0.9, 0.9, 0.9));
/// let index = SpatialIndex::build(&cube, 4);
///
/// assert_eq!(index.triangle_count(), 12);
/// let d2 = index.nearest_squared_distance(&Point3::new(0.0, 0.5, 0.5));
/// assert!((d2 - 0.01).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    pub(crate) nodes: Vec<BvhNode>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) faces: Vec<u32>,
}

impl SpatialIndex {
    /// Build the hierarchy with at most `leaf_size` triangles per leaf.
    ///
    /// Faces that reference missing vertices are skipped. A `leaf_size`
    /// of zero is treated as one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(mesh: &IndexedMesh, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);

        let primitives: Vec<Primitive> = (0..mesh.faces.len())
            .into_par_iter()
            .filter_map(|i| {
                mesh.triangle(i).map(|triangle| Primitive {
                    face: i as u32,
                    triangle,
                    bounds: triangle.bounds(),
                    centroid: triangle.centroid(),
                })
            })
            .collect();

        if primitives.is_empty() {
            return Self {
                nodes: Vec::new(),
                triangles: Vec::new(),
                faces: Vec::new(),
            };
        }

        let mut order: Vec<u32> = (0..primitives.len() as u32).collect();
        let mut nodes = Vec::with_capacity(2 * primitives.len() / leaf_size + 1);
        build_node(&mut nodes, &primitives, &mut order, 0, leaf_size);

        let triangles = order.iter().map(|&i| primitives[i as usize].triangle).collect();
        let faces = order.iter().map(|&i| primitives[i as usize].face).collect();

        let index = Self {
            nodes,
            triangles,
            faces,
        };
        let stats = index.stats();
        debug!(
            triangles = index.triangle_count(),
            nodes = stats.node_count,
            leaves = stats.leaf_count,
            depth = stats.max_depth,
            max_leaf = stats.max_leaf_size,
            "Built spatial index"
        );
        index
    }

    /// Number of indexed triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when the index holds no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bounds of the whole mesh, `None` when empty.
    #[must_use]
    pub fn root_bounds(&self) -> Option<&Aabb> {
        self.nodes.first().map(BvhNode::bounds)
    }

    /// Triangles in leaf order.
    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The arena of nodes; index 0 is the root.
    #[must_use]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Structural statistics.
    #[must_use]
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            node_count: self.nodes.len(),
            ..BvhStats::default()
        };
        if self.nodes.is_empty() {
            return stats;
        }

        let mut stack = vec![(0_u32, 0_usize)];
        while let Some((index, depth)) = stack.pop() {
            stats.max_depth = stats.max_depth.max(depth);
            match self.nodes[index as usize] {
                BvhNode::Leaf { count, .. } => {
                    stats.leaf_count += 1;
                    stats.max_leaf_size = stats.max_leaf_size.max(count as usize);
                }
                BvhNode::Branch { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        stats
    }
}

/// Median split on the longest centroid axis; returns the arena index of the new node.
#[allow(clippy::cast_possible_truncation)]
fn build_node(
    nodes: &mut Vec<BvhNode>,
    primitives: &[Primitive],
    order: &mut [u32],
    start: usize,
    leaf_size: usize,
) -> u32 {
    let bounds = order
        .iter()
        .fold(Aabb::empty(), |acc, &i| acc.union(&primitives[i as usize].bounds));
    let index = nodes.len() as u32;

    if order.len() <= leaf_size {
        nodes.push(BvhNode::Leaf {
            bounds,
            start: start as u32,
            count: order.len() as u32,
        });
        return index;
    }

    let axis = Aabb::from_points(order.iter().map(|&i| &primitives[i as usize].centroid))
        .longest_axis();
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| {
        primitives[a as usize].centroid[axis].total_cmp(&primitives[b as usize].centroid[axis])
    });

    // Reserve the slot so the parent precedes its children.
    nodes.push(BvhNode::Leaf {
        bounds,
        start: 0,
        count: 0,
    });
    let (lower, upper) = order.split_at_mut(mid);
    let left = build_node(nodes, primitives, lower, start, leaf_size);
    let right = build_node(nodes, primitives, upper, start + mid, leaf_size);
    nodes[index as usize] = BvhNode::Branch {
        bounds,
        left,
        right,
    };
    index
}

/// Statistics about the hierarchy's shape.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BvhStats {
    /// Total nodes in the arena.
    pub node_count: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Depth of the deepest leaf (root is 0).
    pub max_depth: usize,
    /// Largest triangle count of any leaf.
    pub max_leaf_size: usize,
}
