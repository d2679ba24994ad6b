//! Property-based tests for the distance field core.
//!
//! Run with: cargo test -p mesh-distfield -- proptest

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use mesh_distfield::{
    brute_force_squared_distance, quantize_distance, sample_distance, sample_field_with_stats,
    Atlas, DistanceField, RayParityClassifier, SpatialIndex,
};
use mesh_types::{IndexedMesh, Point3, Vertex};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-0.5..1.5f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Random triangle soup inside the unit cube.
fn arb_soup(max_faces: usize) -> impl Strategy<Value = IndexedMesh> {
    prop::collection::vec(prop::array::uniform3(prop::array::uniform3(0.0..1.0f64)), 1..=max_faces)
        .prop_map(|triangles| {
            let mut mesh = IndexedMesh::new();
            for corners in triangles {
                let base = mesh.vertices.len() as u32;
                for [x, y, z] in corners {
                    mesh.vertices.push(Vertex::from_coords(x, y, z));
                }
                mesh.faces.push([base, base + 1, base + 2]);
            }
            mesh
        })
}

/// A resolution together with a payload of exactly `n³` bytes.
fn arb_field() -> impl Strategy<Value = DistanceField> {
    (1_usize..=7).prop_flat_map(|n| {
        prop::collection::vec(any::<u8>(), n * n * n)
            .prop_map(move |data| DistanceField::from_bytes(n, data).unwrap())
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_unpack_inverts_pack(field in arb_field()) {
        let atlas = Atlas::pack(&field);
        prop_assert_eq!(atlas.width() * atlas.height(), field.len());
        prop_assert_eq!(atlas.unpack(), field);
    }

    #[test]
    fn proptest_index_matches_brute_force(
        mesh in arb_soup(40),
        leaf_size in 1_usize..8,
        points in prop::collection::vec(arb_point(), 1..20),
    ) {
        let index = SpatialIndex::build(&mesh, leaf_size);
        for point in &points {
            let indexed = index.nearest_squared_distance(point);
            let brute = brute_force_squared_distance(&mesh, point);
            prop_assert!((indexed - brute).abs() <= 1e-12 * brute.max(1.0));
        }
    }

    #[test]
    fn proptest_nearest_point_is_on_reported_face(
        mesh in arb_soup(20),
        point in arb_point(),
    ) {
        let index = SpatialIndex::build(&mesh, 4);
        let nearest = index.nearest(&point).unwrap();
        let triangle = mesh.triangle(nearest.face as usize).unwrap();
        prop_assert!((triangle.distance_squared(&point) - nearest.distance_squared).abs() < 1e-12);
        prop_assert!(((nearest.point - point).norm_squared() - nearest.distance_squared).abs() < 1e-12);
    }

    #[test]
    fn proptest_sampling_is_deterministic(mesh in arb_soup(12), n in 2_usize..6) {
        let index = SpatialIndex::build(&mesh, 4);
        let classifier = RayParityClassifier::new(&index, 1e-9);
        let (parallel, stats_a) = sample_field_with_stats(&index, &classifier, n, true);
        let (sequential, stats_b) = sample_field_with_stats(&index, &classifier, n, false);
        prop_assert_eq!(parallel, sequential);
        prop_assert_eq!(stats_a, stats_b);
        prop_assert_eq!(stats_a.total(), n * n * n);
    }

    #[test]
    fn proptest_quantization_is_monotonic(a in 0.0..2.0f64, b in 0.0..2.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(quantize_distance(lo) <= quantize_distance(hi));
    }

    #[test]
    fn proptest_decoded_distance_is_bounded(field in arb_field(), point in arb_point()) {
        let atlas = Atlas::pack(&field);
        let clamped = point.map(|c| c.clamp(0.0, 1.0));
        let d = sample_distance(&atlas, &point);
        let overshoot = (point - clamped).norm();
        prop_assert!(d >= overshoot - 1e-12);
        prop_assert!(d <= overshoot + 1.0 + 1e-12);
    }
}
