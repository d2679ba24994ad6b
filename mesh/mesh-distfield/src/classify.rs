//! Point-in-solid classification.
//!
//! The sign of the field comes from an [`InsideOutside`] implementation.
//! Both provided classifiers assume a closed, consistently wound surface;
//! on open or non-manifold input their answers are unreliable and no
//! error is raised.

use std::f64::consts::PI;

use mesh_types::{Point3, Vector3};

use crate::bvh::SpatialIndex;
use crate::params::ClassifierKind;

/// Hits closer together than this along one ray are treated as a single
/// edge or vertex graze.
const COINCIDENT_HIT_TOLERANCE: f64 = 1e-10;

/// Where a point lies relative to a closed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// Strictly inside the solid.
    Inside,
    /// Strictly outside the solid.
    Outside,
    /// On the surface, within the classifier's tolerance.
    OnBoundary,
}

impl Containment {
    /// True for `Inside` and `OnBoundary`, which both quantize to zero.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Inside | Self::OnBoundary)
    }
}

/// Inside/outside test for a closed mesh.
///
/// Implementations are queried concurrently from the sampler's worker
/// threads and must not rely on interior mutability.
pub trait InsideOutside: Sync {
    /// Classify a point in normalized space.
    fn classify(&self, point: &Point3<f64>) -> Containment;
}

/// Crossing parity along three fixed, mutually skewed rays.
///
/// A ray whose hits include two at the same distance (an edge or vertex
/// graze) abstains. The point is `Inside` when more rays vote inside than
/// outside; a tie, including three abstentions, resolves to `Outside`.
#[derive(Debug, Clone)]
pub struct RayParityClassifier<'a> {
    index: &'a SpatialIndex,
    directions: [Vector3<f64>; 3],
    boundary_epsilon: f64,
}

impl<'a> RayParityClassifier<'a> {
    /// Create a classifier over `index`.
    #[must_use]
    pub fn new(index: &'a SpatialIndex, boundary_epsilon: f64) -> Self {
        // No ray lies in an axis plane or along a face diagonal.
        let directions = [
            Vector3::new(1.0, 0.318_309_886, 0.141_592_654).normalize(),
            Vector3::new(0.271_828_183, 1.0, 0.577_215_665).normalize(),
            Vector3::new(0.414_213_562, 0.173_205_081, 1.0).normalize(),
        ];
        Self {
            index,
            directions,
            boundary_epsilon,
        }
    }

    fn vote(&self, point: &Point3<f64>, direction: &Vector3<f64>) -> RayVote {
        let mut hits: Vec<f64> = Vec::new();
        self.index.ray_hits(point, direction, |_, t| hits.push(t));

        if hits.iter().any(|&t| t <= self.boundary_epsilon) {
            return RayVote::Boundary;
        }
        hits.sort_by(f64::total_cmp);
        if hits
            .windows(2)
            .any(|pair| pair[1] - pair[0] <= COINCIDENT_HIT_TOLERANCE)
        {
            return RayVote::Abstain;
        }
        if hits.len() % 2 == 1 {
            RayVote::Inside
        } else {
            RayVote::Outside
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RayVote {
    Inside,
    Outside,
    Abstain,
    Boundary,
}

impl InsideOutside for RayParityClassifier<'_> {
    fn classify(&self, point: &Point3<f64>) -> Containment {
        let mut inside = 0;
        let mut outside = 0;
        for direction in &self.directions {
            match self.vote(point, direction) {
                RayVote::Boundary => return Containment::OnBoundary,
                RayVote::Inside => inside += 1,
                RayVote::Outside => outside += 1,
                RayVote::Abstain => {}
            }
        }
        if inside > outside {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }
}

/// Generalized winding number: the signed solid angle of every triangle
/// summed and divided by `4π`.
///
/// Costs O(T) per query, but degrades gracefully on small cracks where
/// parity flips outright.
#[derive(Debug, Clone)]
pub struct WindingNumberClassifier<'a> {
    index: &'a SpatialIndex,
    boundary_epsilon: f64,
}

impl<'a> WindingNumberClassifier<'a> {
    /// Create a classifier over `index`.
    #[must_use]
    pub const fn new(index: &'a SpatialIndex, boundary_epsilon: f64) -> Self {
        Self {
            index,
            boundary_epsilon,
        }
    }

    /// Winding number of the surface around `point`.
    ///
    /// Close to 1 inside a closed outward-wound surface, 0 outside and
    /// -1 inside an inward-wound one.
    #[must_use]
    pub fn winding_number(&self, point: &Point3<f64>) -> f64 {
        let total: f64 = self
            .index
            .triangles()
            .iter()
            .map(|triangle| triangle.solid_angle(point))
            .sum();
        total / (4.0 * PI)
    }
}

impl InsideOutside for WindingNumberClassifier<'_> {
    fn classify(&self, point: &Point3<f64>) -> Containment {
        let eps2 = self.boundary_epsilon * self.boundary_epsilon;
        if self.index.nearest_squared_distance(point) <= eps2 {
            return Containment::OnBoundary;
        }
        if self.winding_number(point).abs() >= 0.5 {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }
}

/// Construct the classifier selected by `kind`.
#[must_use]
pub fn make_classifier<'a>(
    kind: ClassifierKind,
    index: &'a SpatialIndex,
    boundary_epsilon: f64,
) -> Box<dyn InsideOutside + 'a> {
    match kind {
        ClassifierKind::RayParity => Box::new(RayParityClassifier::new(index, boundary_epsilon)),
        ClassifierKind::WindingNumber => {
            Box::new(WindingNumberClassifier::new(index, boundary_epsilon))
        }
    }
}
