//! Generation and marching parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Default grid resolution along each axis.
pub const DEFAULT_RESOLUTION: usize = 64;

/// Default maximum number of triangles per spatial index leaf.
pub const DEFAULT_LEAF_SIZE: usize = 4;

/// Default number of sphere tracing iterations.
pub const DEFAULT_MARCH_STEPS: u32 = 10;

/// Inside/outside algorithm used to sign the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ClassifierKind {
    /// Majority vote of crossing parity along three skewed rays.
    #[default]
    RayParity,
    /// Generalized winding number over every triangle.
    WindingNumber,
}

/// Parameters for distance field generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GenerationParams {
    /// Samples per axis; the field holds `resolution³` bytes.
    pub resolution: usize,
    /// Maximum triangles per spatial index leaf.
    pub leaf_size: usize,
    /// Inside/outside algorithm.
    pub classifier: ClassifierKind,
    /// Distance (normalized units) within which a sample counts as on the surface.
    pub boundary_epsilon: f64,
    /// Sample y-slabs on the rayon pool. Output is identical either way.
    pub parallel: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            leaf_size: DEFAULT_LEAF_SIZE,
            classifier: ClassifierKind::RayParity,
            boundary_epsilon: 1e-9,
            parallel: true,
        }
    }
}

impl GenerationParams {
    /// Coarse grid for quick previews.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            resolution: 32,
            ..Self::default()
        }
    }

    /// Fine grid with the winding number classifier.
    ///
    /// Slower per sample, but tolerant of small cracks in the input.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            resolution: 128,
            classifier: ClassifierKind::WindingNumber,
            ..Self::default()
        }
    }

    /// Check that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidConfig`] if the resolution is below 2,
    /// the leaf size is zero, or the boundary epsilon is not a positive
    /// finite number.
    pub fn validate(&self) -> FieldResult<()> {
        if self.resolution < 2 {
            return Err(FieldError::invalid_config(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        if self.resolution.checked_pow(3).is_none() {
            return Err(FieldError::invalid_config(format!(
                "resolution {} overflows the voxel count",
                self.resolution
            )));
        }
        if self.leaf_size == 0 {
            return Err(FieldError::invalid_config("leaf size must be positive"));
        }
        if !(self.boundary_epsilon.is_finite() && self.boundary_epsilon > 0.0) {
            return Err(FieldError::invalid_config(format!(
                "boundary epsilon must be positive, got {}",
                self.boundary_epsilon
            )));
        }
        Ok(())
    }
}

/// When a sphere tracing march stops.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Termination {
    /// Always run every step, with no early exit and no escape distance.
    #[default]
    FixedSteps,
    /// Stop once a step is shorter than `epsilon` or `t` exceeds `max_distance`.
    Converge {
        /// Step length treated as a surface hit.
        epsilon: f64,
        /// Distance treated as a miss.
        max_distance: f64,
    },
}

/// Parameters for sphere tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MarchParams {
    /// Maximum number of distance samples per ray.
    pub steps: u32,
    /// Stopping rule.
    pub termination: Termination,
}

impl Default for MarchParams {
    fn default() -> Self {
        Self {
            steps: DEFAULT_MARCH_STEPS,
            termination: Termination::FixedSteps,
        }
    }
}

impl MarchParams {
    /// Fixed-step march with the given iteration count.
    #[must_use]
    pub const fn with_steps(steps: u32) -> Self {
        Self {
            steps,
            termination: Termination::FixedSteps,
        }
    }

    /// Check that the parameters describe a usable march.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidConfig`] for zero steps, or for a
    /// converging march whose thresholds are not positive.
    pub fn validate(&self) -> FieldResult<()> {
        if self.steps == 0 {
            return Err(FieldError::invalid_config("march steps must be positive"));
        }
        if let Termination::Converge {
            epsilon,
            max_distance,
        } = self.termination
        {
            if !(epsilon > 0.0 && max_distance > 0.0) {
                return Err(FieldError::invalid_config(format!(
                    "convergence thresholds must be positive, got epsilon {epsilon} and max distance {max_distance}"
                )));
            }
        }
        Ok(())
    }
}
