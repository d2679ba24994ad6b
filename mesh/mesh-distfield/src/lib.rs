//! Quantized distance fields from closed triangle meshes.
//!
//! A mesh is fitted into the unit cube, indexed with a bounding volume
//! hierarchy and sampled on an `N×N×N` grid of cell centers. Each sample
//! stores one byte: 0 on or inside the surface, otherwise the distance to
//! the surface clamped to 1.0 and scaled to 255.
//!
//! The same bytes, read as an `N·N × N` image, form a slice atlas that a
//! renderer can sphere trace directly. [`sample_distance`] and [`march`]
//! reproduce that lookup on the CPU.
//!
//! # Pipeline
//!
//! 1. [`normalize_mesh`] - fit the mesh into the central 80% of `[0, 1]³`
//! 2. [`SpatialIndex::build`] - flat-arena BVH over the triangles
//! 3. [`InsideOutside`] - sign each sample ([`RayParityClassifier`] or
//!    [`WindingNumberClassifier`])
//! 4. [`sample_field`] - quantize every voxel, y-slabs in parallel
//! 5. [`Atlas::pack`] - lay the volume out as an image
//!
//! # Example
//!
//! ```
//! use mesh_distfield::{march, Atlas, FieldBuilder, MarchParams};
//! use mesh_types::{axis_aligned_box, Point3, Vector3};
//!
//! let cube = axis_aligned_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
//! let generated = FieldBuilder::new(&cube).resolution(16).build().unwrap();
//!
//! let atlas = Atlas::pack(&generated.field);
//! let t = march(
//!     &atlas,
//!     &Point3::new(0.5, 0.5, -1.0),
//!     &Vector3::new(0.0, 0.0, 1.0),
//!     &MarchParams::default(),
//! );
//! assert!(t > 1.0 && t < 1.2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod atlas;
mod bvh;
mod classify;
mod error;
mod field;
mod normalize;
mod params;
mod pipeline;
mod query;
mod render;
mod sampler;
mod trace;

pub use atlas::Atlas;
pub use bvh::{BvhNode, BvhStats, SpatialIndex};
pub use classify::{
    make_classifier, Containment, InsideOutside, RayParityClassifier, WindingNumberClassifier,
};
pub use error::{FieldError, FieldResult};
pub use field::{DistanceField, FieldSummary, StagedOutput, SATURATED, SOLID};
pub use normalize::{normalize_mesh, Normalization, FILL_FRACTION};
pub use params::{
    ClassifierKind, GenerationParams, MarchParams, Termination, DEFAULT_LEAF_SIZE,
    DEFAULT_MARCH_STEPS, DEFAULT_RESOLUTION,
};
pub use pipeline::{generate_field, generate_to_file, FieldBuilder, GeneratedField};
pub use query::{brute_force_squared_distance, Nearest};
pub use render::{render_depth, Camera, DepthImage, Viewport};
pub use sampler::{quantize_distance, sample_field, sample_field_with_stats, SamplingStats};
pub use trace::{march, sample_distance};
