//! End-to-end generation: mesh set in, distance field out.
//!
//! # Example
//!
//! ```
//! use mesh_distfield::FieldBuilder;
//! use mesh_types::{axis_aligned_box, Point3};
//!
//! let cube = axis_aligned_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
//! let generated = FieldBuilder::new(&cube).resolution(8).build().unwrap();
//!
//! assert_eq!(generated.field.len(), 512);
//! assert!(generated.stats.inside > 0);
//! ```

use std::path::Path;
use std::time::Instant;

use mesh_types::IndexedMesh;
use tracing::{info, warn};

use crate::bvh::{BvhStats, SpatialIndex};
use crate::classify::make_classifier;
use crate::error::{FieldError, FieldResult};
use crate::field::{DistanceField, StagedOutput};
use crate::normalize::{normalize_mesh, Normalization};
use crate::params::{ClassifierKind, GenerationParams};
use crate::sampler::{sample_field_with_stats, SamplingStats};

/// Everything produced by one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedField {
    /// The quantized volume.
    pub field: DistanceField,
    /// Map from model space into the sampled cube.
    pub normalization: Normalization,
    /// Classification counts.
    pub stats: SamplingStats,
    /// Shape of the spatial index used.
    pub index_stats: BvhStats,
}

/// Generate a field from a mesh set that must hold exactly one mesh.
///
/// # Errors
///
/// Returns [`FieldError::UnsupportedMeshCount`] unless `meshes` has one
/// element, [`FieldError::InvalidConfig`] for out-of-range parameters and
/// [`FieldError::InvalidMesh`] for empty or degenerate geometry.
pub fn generate_field(meshes: &[IndexedMesh], params: &GenerationParams) -> FieldResult<GeneratedField> {
    let mesh = single_mesh(meshes)?;
    params.validate()?;
    run(mesh, params)
}

/// Generate a field and write it to `output`.
///
/// The output is reserved before any sampling, so an unwritable
/// destination fails fast. Nothing is written to `output` unless the whole
/// field is computed.
///
/// # Errors
///
/// As [`generate_field`], plus [`FieldError::Io`] if the output cannot be
/// created or written.
pub fn generate_to_file<P: AsRef<Path>>(
    meshes: &[IndexedMesh],
    params: &GenerationParams,
    output: P,
) -> FieldResult<GeneratedField> {
    let mesh = single_mesh(meshes)?;
    params.validate()?;
    let staged = StagedOutput::create(output)?;
    let generated = run(mesh, params)?;
    staged.commit(&generated.field)?;
    Ok(generated)
}

fn single_mesh(meshes: &[IndexedMesh]) -> FieldResult<&IndexedMesh> {
    match meshes {
        [mesh] => Ok(mesh),
        _ => Err(FieldError::UnsupportedMeshCount {
            count: meshes.len(),
        }),
    }
}

fn run(mesh: &IndexedMesh, params: &GenerationParams) -> FieldResult<GeneratedField> {
    let started = Instant::now();
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        resolution = params.resolution,
        classifier = ?params.classifier,
        "Generating distance field"
    );

    let (normalized, normalization) = normalize_mesh(mesh)?;
    let index = SpatialIndex::build(&normalized, params.leaf_size);
    let index_stats = index.stats();

    let classifier = make_classifier(params.classifier, &index, params.boundary_epsilon);
    let (field, stats) =
        sample_field_with_stats(&index, classifier.as_ref(), params.resolution, params.parallel);

    if stats.inside == 0 {
        warn!("No sample classified inside; the mesh may be open or too thin for this resolution");
    }
    info!(
        elapsed_ms = started.elapsed().as_millis(),
        "Distance field complete"
    );

    Ok(GeneratedField {
        field,
        normalization,
        stats,
        index_stats,
    })
}

/// Fluent builder for a generation run.
///
/// Starts from [`GenerationParams::default`].
#[derive(Debug, Clone)]
pub struct FieldBuilder<'a> {
    mesh: &'a IndexedMesh,
    params: GenerationParams,
}

impl<'a> FieldBuilder<'a> {
    /// Create a builder for `mesh`.
    #[must_use]
    pub fn new(mesh: &'a IndexedMesh) -> Self {
        Self {
            mesh,
            params: GenerationParams::default(),
        }
    }

    /// Replace every parameter at once.
    #[must_use]
    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Samples per axis.
    #[must_use]
    pub const fn resolution(mut self, resolution: usize) -> Self {
        self.params.resolution = resolution;
        self
    }

    /// Maximum triangles per spatial index leaf.
    #[must_use]
    pub const fn leaf_size(mut self, leaf_size: usize) -> Self {
        self.params.leaf_size = leaf_size;
        self
    }

    /// Inside/outside algorithm.
    #[must_use]
    pub const fn classifier(mut self, classifier: ClassifierKind) -> Self {
        self.params.classifier = classifier;
        self
    }

    /// Surface tolerance in normalized units.
    #[must_use]
    pub const fn boundary_epsilon(mut self, epsilon: f64) -> Self {
        self.params.boundary_epsilon = epsilon;
        self
    }

    /// Sample on the rayon pool or on the calling thread.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.params.parallel = parallel;
        self
    }

    /// Use [`GenerationParams::preview`].
    #[must_use]
    pub fn preview(self) -> Self {
        self.params(GenerationParams::preview())
    }

    /// Use [`GenerationParams::high_quality`].
    #[must_use]
    pub fn high_quality(self) -> Self {
        self.params(GenerationParams::high_quality())
    }

    /// Parameters as configured so far.
    #[must_use]
    pub const fn current_params(&self) -> &GenerationParams {
        &self.params
    }

    /// Run generation in memory.
    ///
    /// # Errors
    ///
    /// See [`generate_field`].
    pub fn build(self) -> FieldResult<GeneratedField> {
        generate_field(std::slice::from_ref(self.mesh), &self.params)
    }

    /// Run generation and write the field to `output`.
    ///
    /// # Errors
    ///
    /// See [`generate_to_file`].
    pub fn write_to<P: AsRef<Path>>(self, output: P) -> FieldResult<GeneratedField> {
        generate_to_file(std::slice::from_ref(self.mesh), &self.params, output)
    }
}
