//! Distance reconstruction from an atlas and sphere tracing.
//!
//! Lookups are nearest-texel in x and y but blend linearly between the
//! two neighbouring z-slices, so no single fetch straddles two slices of
//! the atlas.

use mesh_types::{Point3, Vector3};

use crate::atlas::Atlas;
use crate::params::{MarchParams, Termination};

/// Estimated distance from `point` to the surface.
///
/// `point` is clamped to the unit cube; the distance from `point` to its
/// clamped position is added to the decoded field value, so the estimate
/// stays conservative outside the sampled domain.
///
/// # Example
///
/// ```
/// use mesh_distfield::{sample_distance, Atlas};
/// use mesh_types::Point3;
///
/// let atlas = Atlas::from_bytes(2, vec![0; 8]).unwrap();
/// let d = sample_distance(&atlas, &Point3::new(1.5, 0.5, 0.5));
/// assert!((d - 0.5).abs() < 1e-12);
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sample_distance(atlas: &Atlas, point: &Point3<f64>) -> f64 {
    let n = atlas.resolution();
    if n == 0 {
        return 0.0;
    }
    let clamped = point.map(|c| c.clamp(0.0, 1.0));
    let scale = n as f64;
    let last = n - 1;
    let texel = |c: f64| ((c * scale).floor() as usize).min(last);

    let x = texel(clamped.x);
    let y = texel(clamped.y);
    let z_scaled = clamped.z * scale;
    let z0 = (z_scaled.floor() as usize).min(last);
    let z1 = (z0 + 1).min(last);
    let blend = z_scaled.fract();

    let d0 = f64::from(atlas.slice_texel(x, y, z0)) / 255.0;
    let d1 = f64::from(atlas.slice_texel(x, y, z1)) / 255.0;
    let decoded = d0 + (d1 - d0) * blend;

    decoded + (point - clamped).norm()
}

/// March a ray through the field and return the accumulated distance `t`.
///
/// Each step adds [`sample_distance`] at `origin + t * direction`. With
/// [`Termination::FixedSteps`] exactly `params.steps` samples are taken;
/// [`Termination::Converge`] stops early on a short step or once `t`
/// exceeds its maximum distance.
#[must_use]
pub fn march(
    atlas: &Atlas,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    params: &MarchParams,
) -> f64 {
    let mut t = 0.0;
    for _ in 0..params.steps {
        let step = sample_distance(atlas, &(origin + direction * t));
        t += step;
        if let Termination::Converge {
            epsilon,
            max_distance,
        } = params.termination
        {
            if step < epsilon || t > max_distance {
                break;
            }
        }
    }
    t
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::field::DistanceField;
    use approx::assert_relative_eq;

    /// Field whose value depends only on z-slice: 0, 51, 102, ...
    fn z_ramp(n: usize) -> Atlas {
        let mut data = vec![0_u8; n * n * n];
        for y in 0..n {
            for z in 0..n {
                for x in 0..n {
                    data[y * n * n + z * n + x] = u8::try_from(z * 51).unwrap();
                }
            }
        }
        Atlas::pack(&DistanceField::from_bytes(n, data).unwrap())
    }

    #[test]
    fn interpolates_between_slices() {
        let atlas = z_ramp(4);
        // z * 4 = 1.5: halfway between slice 1 (0.2) and slice 2 (0.4).
        let d = sample_distance(&atlas, &Point3::new(0.3, 0.7, 0.375));
        assert_relative_eq!(d, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn nearest_in_x_and_y() {
        let n = 2;
        let mut data = vec![0_u8; 8];
        // voxel (1, 0, 0)
        data[1] = 255;
        let atlas = Atlas::pack(&DistanceField::from_bytes(n, data).unwrap());
        assert_eq!(sample_distance(&atlas, &Point3::new(0.49, 0.1, 0.0)), 0.0);
        assert_eq!(sample_distance(&atlas, &Point3::new(0.5, 0.1, 0.0)), 1.0);
    }

    #[test]
    fn top_face_uses_last_slice() {
        let atlas = z_ramp(4);
        let d = sample_distance(&atlas, &Point3::new(0.5, 0.5, 1.0));
        assert_relative_eq!(d, 153.0 / 255.0, epsilon = 1e-12);
    }

    #[test]
    fn outside_adds_clamp_distance() {
        let atlas = z_ramp(4);
        let inside = sample_distance(&atlas, &Point3::new(1.0, 0.0, 0.0));
        let outside = sample_distance(&atlas, &Point3::new(4.0, -4.0, 0.0));
        assert_relative_eq!(outside - inside, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn fixed_steps_accumulate() {
        let atlas = Atlas::from_bytes(2, vec![51; 8]).unwrap();
        let origin = Point3::new(0.5, 0.5, 0.5);
        let dir = Vector3::new(0.0, 0.0, 1.0);
        // Uniform 0.2 everywhere inside the cube.
        let t1 = march(&atlas, &origin, &dir, &MarchParams::with_steps(1));
        let t2 = march(&atlas, &origin, &dir, &MarchParams::with_steps(2));
        assert_relative_eq!(t1, 0.2, epsilon = 1e-12);
        assert_relative_eq!(t2, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn converge_stops_early() {
        let atlas = Atlas::from_bytes(2, vec![0; 8]).unwrap();
        let params = MarchParams {
            steps: 1000,
            termination: Termination::Converge {
                epsilon: 1e-6,
                max_distance: 10.0,
            },
        };
        let t = march(
            &atlas,
            &Point3::new(0.5, 0.5, 0.5),
            &Vector3::new(1.0, 0.0, 0.0),
            &params,
        );
        assert_eq!(t, 0.0);
    }

    #[test]
    fn converge_escapes() {
        let atlas = Atlas::from_bytes(2, vec![255; 8]).unwrap();
        let params = MarchParams {
            steps: 1000,
            termination: Termination::Converge {
                epsilon: 1e-6,
                max_distance: 3.0,
            },
        };
        let t = march(
            &atlas,
            &Point3::new(0.5, 0.5, 0.5),
            &Vector3::new(1.0, 0.0, 0.0),
            &params,
        );
        assert!(t > 3.0);
        assert!(t < 10.0);
    }
}
