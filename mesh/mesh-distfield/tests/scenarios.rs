//! End-to-end scenarios for generation, decoding and marching.
//!
//! Run with: cargo test -p mesh-distfield --test scenarios

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]

use approx::assert_relative_eq;
use mesh_distfield::{
    generate_field, march, normalize_mesh, quantize_distance, sample_distance, sample_field,
    sample_field_with_stats, Atlas, ClassifierKind, Containment, DistanceField, FieldError,
    GenerationParams, InsideOutside, MarchParams, RayParityClassifier, SpatialIndex,
    WindingNumberClassifier, SATURATED,
};
use mesh_types::{axis_aligned_box, IndexedMesh, Point3, Vector3, Vertex};

fn centered_cube(half_extent: f64) -> IndexedMesh {
    axis_aligned_box(
        Point3::new(0.5 - half_extent, 0.5 - half_extent, 0.5 - half_extent),
        Point3::new(0.5 + half_extent, 0.5 + half_extent, 0.5 + half_extent),
    )
}

/// Double pyramid over an arrowhead outline with its notch facing -x.
fn dart_bipyramid() -> IndexedMesh {
    let outline = [(0.1, 0.1), (0.9, 0.5), (0.1, 0.9), (0.4, 0.5)];
    let mut mesh = IndexedMesh::new();
    for (x, y) in outline {
        mesh.vertices.push(Vertex::from_coords(x, y, 0.5));
    }
    mesh.vertices.push(Vertex::from_coords(0.55, 0.5, 0.9));
    mesh.vertices.push(Vertex::from_coords(0.55, 0.5, 0.1));
    for i in 0..4 {
        let next = (i + 1) % 4;
        mesh.faces.push([i, next, 4]);
        mesh.faces.push([next, i, 5]);
    }
    mesh
}

// =============================================================================
// Sampling
// =============================================================================

#[test]
fn cube_half_extent_04_at_resolution_4() {
    let mesh = centered_cube(0.4);
    let index = SpatialIndex::build(&mesh, 4);
    let classifier = RayParityClassifier::new(&index, 1e-9);
    let field = sample_field(&index, &classifier, 4);

    // (0.625, 0.625, 0.625) is voxel (2, 2, 2).
    assert_eq!(
        classifier.classify(&Point3::new(0.625, 0.625, 0.625)),
        Containment::Inside
    );
    assert_eq!(field.get(2, 2, 2), Some(0));

    // Faces sit at 0.1 and 0.9, so the corner cell center 0.125 is inside too.
    assert!(classifier
        .classify(&Point3::new(0.125, 0.125, 0.125))
        .is_solid());
    assert_eq!(field.get(0, 0, 0), Some(0));
}

#[test]
fn corner_voxel_outside_a_smaller_cube() {
    let mesh = centered_cube(0.3);
    let index = SpatialIndex::build(&mesh, 4);
    let classifier = RayParityClassifier::new(&index, 1e-9);
    let field = sample_field(&index, &classifier, 4);

    let corner = Point3::new(0.125, 0.125, 0.125);
    assert_eq!(classifier.classify(&corner), Containment::Outside);
    // Nearest feature is the cube corner at 0.2.
    let expected = quantize_distance((3.0_f64 * 0.075 * 0.075).sqrt());
    assert!(expected > 0);
    assert_eq!(field.get(0, 0, 0), Some(expected));
    assert_eq!(field.get(2, 2, 2), Some(0));
}

#[test]
fn far_samples_saturate() {
    // A small cube in one corner; the opposite corner is more than 1.0 away.
    let mesh = axis_aligned_box(Point3::new(0.0, 0.0, 0.0), Point3::new(0.05, 0.05, 0.05));
    let index = SpatialIndex::build(&mesh, 4);
    let classifier = RayParityClassifier::new(&index, 1e-9);
    let (field, stats) = sample_field_with_stats(&index, &classifier, 8, true);

    let far = Point3::new(0.9375, 0.9375, 0.9375);
    assert!(index.nearest_squared_distance(&far).sqrt() > 1.0);
    assert_eq!(field.get(7, 7, 7), Some(SATURATED));
    assert!(stats.saturated >= 1);
}

#[test]
fn classifiers_produce_same_cube_field() {
    let (mesh, _) = normalize_mesh(&centered_cube(3.0)).unwrap();
    let index = SpatialIndex::build(&mesh, 4);
    let parity = RayParityClassifier::new(&index, 1e-9);
    let winding = WindingNumberClassifier::new(&index, 1e-9);
    assert_eq!(
        sample_field(&index, &parity, 12),
        sample_field(&index, &winding, 12)
    );
}

#[test]
fn classifiers_agree_on_concave_solid() {
    let mesh = dart_bipyramid();
    let index = SpatialIndex::build(&mesh, 4);
    let parity = RayParityClassifier::new(&index, 1e-9);
    let winding = WindingNumberClassifier::new(&index, 1e-9);

    let n = 24;
    let mut solid = 0;
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                let p = Point3::new(
                    (x as f64 + 0.5) / n as f64,
                    (y as f64 + 0.5) / n as f64,
                    (z as f64 + 0.5) / n as f64,
                );
                let a = parity.classify(&p).is_solid();
                assert_eq!(a, winding.classify(&p).is_solid(), "disagree at {p:?}");
                solid += usize::from(a);
            }
        }
    }
    assert!(solid > 0);

    // The notch between the two barbs is outside.
    for x in [0.15, 0.25, 0.35] {
        let p = Point3::new(x, 0.5, 0.5);
        assert_eq!(parity.classify(&p), Containment::Outside);
        assert_eq!(winding.classify(&p), Containment::Outside);
    }
    let core = Point3::new(0.6, 0.5, 0.5);
    assert_eq!(parity.classify(&core), Containment::Inside);
    assert_eq!(winding.classify(&core), Containment::Inside);
}

#[test]
fn sampling_is_deterministic() {
    let params = GenerationParams {
        resolution: 12,
        ..GenerationParams::default()
    };
    let mesh = centered_cube(2.0);
    let a = generate_field(std::slice::from_ref(&mesh), &params).unwrap();
    let b = generate_field(
        std::slice::from_ref(&mesh),
        &GenerationParams {
            parallel: false,
            ..params.clone()
        },
    )
    .unwrap();
    let c = generate_field(std::slice::from_ref(&mesh), &params).unwrap();
    assert_eq!(a.field, b.field);
    assert_eq!(a.field, c.field);
}

#[test]
fn winding_number_pipeline() {
    let params = GenerationParams {
        resolution: 6,
        classifier: ClassifierKind::WindingNumber,
        ..GenerationParams::default()
    };
    let generated = generate_field(&[centered_cube(1.0)], &params).unwrap();
    assert_eq!(generated.field.get(3, 3, 3), Some(0));
    assert!(generated.stats.outside > 0);
}

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn normalization_fits_largest_axis() {
    let mesh = axis_aligned_box(Point3::new(-7.0, 1.0, 100.0), Point3::new(3.0, 4.0, 102.0));
    let (unit, norm) = normalize_mesh(&mesh).unwrap();
    let bounds = unit.bounds();
    assert_relative_eq!(bounds.max_extent(), 0.8, epsilon = 1e-12);
    assert_relative_eq!(bounds.size().y, 0.24, epsilon = 1e-12);
    assert_relative_eq!(bounds.center(), Point3::new(0.5, 0.5, 0.5), epsilon = 1e-12);
    assert_relative_eq!(norm.model_distance(0.08), 1.0, epsilon = 1e-12);
}

#[test]
fn empty_mesh_is_invalid() {
    assert!(matches!(
        generate_field(&[IndexedMesh::new()], &GenerationParams::preview()),
        Err(FieldError::InvalidMesh { .. })
    ));
}

// =============================================================================
// Decoding and marching
// =============================================================================

#[test]
fn all_zero_field_marches_nowhere() {
    let atlas = Atlas::pack(&DistanceField::filled(8, 0).unwrap());
    let origins = [
        Point3::new(0.5, 0.5, 0.5),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.1, 0.9, 0.3),
    ];
    let directions = [
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(-0.3, 0.8, 0.1).normalize(),
        Vector3::new(0.0, 0.0, -1.0),
    ];
    for origin in &origins {
        for direction in &directions {
            for steps in [1, 10, 100] {
                let t = march(&atlas, origin, direction, &MarchParams::with_steps(steps));
                assert_eq!(t, 0.0);
            }
        }
    }
}

#[test]
fn exiting_ray_runs_every_step() {
    let atlas = Atlas::pack(&DistanceField::filled(4, 64).unwrap());
    let origin = Point3::new(0.99, 0.5, 0.5);
    let direction = Vector3::new(1.0, 0.0, 0.0);

    for steps in [1_u32, 2, 5, 10, 25] {
        let t = march(&atlas, &origin, &direction, &MarchParams::with_steps(steps));

        let mut expected = 0.0;
        for _ in 0..steps {
            expected += sample_distance(&atlas, &(origin + direction * expected));
        }
        assert!(t.is_finite());
        assert!(t >= 0.0);
        assert_eq!(t, expected);
    }

    // Every step is positive, so one more step always goes further.
    let t9 = march(&atlas, &origin, &direction, &MarchParams::with_steps(9));
    let t10 = march(&atlas, &origin, &direction, &MarchParams::default());
    assert!(t10 > t9);
}

#[test]
fn top_boundary_never_overruns() {
    let n = 5;
    let mut data = vec![0_u8; n * n * n];
    for y in 0..n {
        for x in 0..n {
            // last slice only
            data[y * n * n + (n - 1) * n + x] = 200;
        }
    }
    let atlas = Atlas::pack(&DistanceField::from_bytes(n, data).unwrap());

    for &z in &[1.0, 1.0 - 1e-12, 0.999] {
        let d = sample_distance(&atlas, &Point3::new(0.5, 0.5, z));
        assert!(d <= 200.0 / 255.0 + 1e-12);
    }
    assert_relative_eq!(
        sample_distance(&atlas, &Point3::new(0.5, 0.5, 1.0)),
        200.0 / 255.0
    );
    assert_relative_eq!(
        sample_distance(&atlas, &Point3::new(0.5, 0.5, 3.0)),
        200.0 / 255.0 + 2.0
    );
}

#[test]
fn generated_cube_renders_surface_depth() {
    let generated = generate_field(&[centered_cube(1.0)], &GenerationParams::preview()).unwrap();
    let atlas = Atlas::pack(&generated.field);

    // Start outside on +x, aim at the center; the face is at x = 0.9.
    let origin = Point3::new(2.0, 0.5, 0.5);
    let t = march(&atlas, &origin, &Vector3::new(-1.0, 0.0, 0.0), &MarchParams::default());
    assert!(t > 1.0);
    assert!(t < 1.1 + 1.0 / 32.0);
}
