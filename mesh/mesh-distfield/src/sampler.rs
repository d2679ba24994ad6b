//! Grid sampling and quantization.

use std::time::Instant;

use mesh_types::Point3;
use rayon::prelude::*;
use tracing::info;

use crate::bvh::SpatialIndex;
use crate::classify::InsideOutside;
use crate::field::{DistanceField, SATURATED, SOLID};

/// Counts gathered while sampling a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    /// Samples classified inside or on the surface.
    pub inside: usize,
    /// Samples classified outside.
    pub outside: usize,
    /// Outside samples at or beyond distance 1.0.
    pub saturated: usize,
}

impl SamplingStats {
    /// Total samples taken.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inside + self.outside
    }

    const fn merge(self, other: Self) -> Self {
        Self {
            inside: self.inside + other.inside,
            outside: self.outside + other.outside,
            saturated: self.saturated + other.saturated,
        }
    }
}

/// Map a non-negative distance onto a byte: `round(clamp(d, 0, 1) * 255)`.
///
/// NaN quantizes to [`SATURATED`].
///
/// ```
/// use mesh_distfield::quantize_distance;
///
/// assert_eq!(quantize_distance(0.0), 0);
/// assert_eq!(quantize_distance(0.5), 128);
/// assert_eq!(quantize_distance(3.0), 255);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize_distance(distance: f64) -> u8 {
    if distance.is_nan() {
        return SATURATED;
    }
    (distance.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Sample an `n³` grid of cell centers in parallel.
///
/// Each sample at `((x + 0.5) / n, (y + 0.5) / n, (z + 0.5) / n)` is
/// classified first; solid samples store 0, the rest store the quantized
/// distance to the nearest triangle.
#[must_use]
pub fn sample_field(index: &SpatialIndex, classifier: &dyn InsideOutside, n: usize) -> DistanceField {
    sample_field_with_stats(index, classifier, n, true).0
}

/// Sample an `n³` grid, optionally on a single thread, returning counts.
///
/// The parallel path hands each y-slab (one contiguous `n·n` run of the
/// file layout) to a rayon worker. Output does not depend on `parallel`.
#[must_use]
pub fn sample_field_with_stats(
    index: &SpatialIndex,
    classifier: &dyn InsideOutside,
    n: usize,
    parallel: bool,
) -> (DistanceField, SamplingStats) {
    let started = Instant::now();
    let mut data = vec![0_u8; n * n * n];

    let stats = if n == 0 {
        SamplingStats::default()
    } else if parallel {
        data.par_chunks_mut(n * n)
            .enumerate()
            .map(|(y, slab)| sample_slab(index, classifier, n, y, slab))
            .reduce(SamplingStats::default, SamplingStats::merge)
    } else {
        data.chunks_mut(n * n)
            .enumerate()
            .map(|(y, slab)| sample_slab(index, classifier, n, y, slab))
            .fold(SamplingStats::default(), SamplingStats::merge)
    };

    info!(
        resolution = n,
        inside = stats.inside,
        outside = stats.outside,
        saturated = stats.saturated,
        parallel,
        elapsed_ms = started.elapsed().as_millis(),
        "Sampled distance field"
    );
    (DistanceField::from_raw(n, data), stats)
}

#[allow(clippy::cast_precision_loss)]
fn sample_slab(
    index: &SpatialIndex,
    classifier: &dyn InsideOutside,
    n: usize,
    y: usize,
    slab: &mut [u8],
) -> SamplingStats {
    let cell = 1.0 / n as f64;
    let center = |i: usize| (i as f64 + 0.5) * cell;
    let py = center(y);
    let mut stats = SamplingStats::default();

    for z in 0..n {
        for x in 0..n {
            let point = Point3::new(center(x), py, center(z));
            slab[z * n + x] = if classifier.classify(&point).is_solid() {
                stats.inside += 1;
                SOLID
            } else {
                stats.outside += 1;
                let value = quantize_distance(index.nearest_squared_distance(&point).sqrt());
                if value == SATURATED {
                    stats.saturated += 1;
                }
                value
            };
        }
    }
    stats
}
