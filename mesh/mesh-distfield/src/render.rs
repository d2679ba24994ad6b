//! Offline depth rendering by per-pixel sphere tracing.

use mesh_types::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::atlas::Atlas;
use crate::params::MarchParams;
use crate::trace::march;

/// A pinhole camera given by its eye point and basis vectors.
///
/// `forward` is normalized; `right` and `up` scale the image plane and
/// are used as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Ray origin.
    pub eye: Point3<f64>,
    /// View direction through the image center.
    pub forward: Vector3<f64>,
    /// Image-plane x axis.
    pub right: Vector3<f64>,
    /// Image-plane y axis.
    pub up: Vector3<f64>,
}

impl Camera {
    /// Default orbit radius around the cube center.
    pub const DEFAULT_RADIUS: f64 = 1.5;
    /// Default polar angle from +z.
    pub const DEFAULT_THETA: f64 = 1.39;
    /// Default azimuth in the xy plane.
    pub const DEFAULT_PHI: f64 = -2.8;

    /// Orbit camera looking at `(0.5, 0.5, 0.5)` from spherical coordinates.
    ///
    /// `theta` is measured from +z and `phi` around it from +x. `right`
    /// stays horizontal and `up` is `right × forward`.
    ///
    /// ```
    /// use mesh_distfield::Camera;
    ///
    /// let camera = Camera::orbit(2.0, std::f64::consts::FRAC_PI_2, 0.0);
    /// assert!((camera.eye.x - 2.5).abs() < 1e-12);
    /// assert!((camera.forward.x + 1.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn orbit(radius: f64, theta: f64, phi: f64) -> Self {
        let eye = Point3::new(
            radius * theta.sin() * phi.cos() + 0.5,
            radius * theta.sin() * phi.sin() + 0.5,
            radius * theta.cos() + 0.5,
        );
        let forward = (Point3::new(0.5, 0.5, 0.5) - eye).normalize();
        let azimuth = phi - std::f64::consts::FRAC_PI_2;
        let right = Vector3::new(azimuth.cos(), azimuth.sin(), 0.0);
        let up = right.cross(&forward);
        Self {
            eye,
            forward,
            right,
            up,
        }
    }

    /// Ray direction through the image-plane offset `(x, y)`.
    #[must_use]
    pub fn ray_direction(&self, x: f64, y: f64) -> Vector3<f64> {
        (self.forward + self.right * x + self.up * y).normalize()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::orbit(Self::DEFAULT_RADIUS, Self::DEFAULT_THETA, Self::DEFAULT_PHI)
    }
}

/// Output image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Pixels per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Image-plane offset of the center of pixel `(px, py)`, `py` counted from the bottom.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pixel_offset(&self, px: usize, py: usize) -> (f64, f64) {
        let w = self.width as f64;
        let h = self.height as f64;
        let x = (px as f64 + 0.5 - w / 2.0) / w;
        let y = (h / w) * (py as f64 + 0.5 - h / 2.0) / h;
        (x, y)
    }
}

/// Raw accumulated march distances, one per pixel, bottom row first.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    width: usize,
    height: usize,
    depths: Vec<f64>,
}

impl DepthImage {
    /// Pixels per row.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Depth at `(px, py)`, `None` outside the image.
    #[must_use]
    pub fn get(&self, px: usize, py: usize) -> Option<f64> {
        (px < self.width && py < self.height).then(|| self.depths[py * self.width + px])
    }

    /// Smallest and largest depth, `None` for an empty image.
    #[must_use]
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.depths.iter().fold(None, |acc, &d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }

    /// Depths in row-major order, bottom row first.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.depths
    }

    /// Depths as little-endian `f32`, the layout a float texture upload expects.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32_le_bytes(&self) -> Vec<u8> {
        self.depths
            .iter()
            .flat_map(|&d| (d as f32).to_le_bytes())
            .collect()
    }
}

/// March one ray per pixel of `viewport` from `camera.eye`.
///
/// Rows are traced in parallel; the result does not depend on scheduling.
#[must_use]
pub fn render_depth(
    atlas: &Atlas,
    camera: &Camera,
    viewport: Viewport,
    params: &MarchParams,
) -> DepthImage {
    let Viewport { width, height } = viewport;
    let mut depths = vec![0.0; width * height];

    if width > 0 {
        depths.par_chunks_mut(width).enumerate().for_each(|(py, row)| {
            for (px, depth) in row.iter_mut().enumerate() {
                let (x, y) = viewport.pixel_offset(px, py);
                *depth = march(atlas, &camera.eye, &camera.ray_direction(x, y), params);
            }
        });
    }

    debug!(width, height, steps = params.steps, "Rendered depth image");
    DepthImage {
        width,
        height,
        depths,
    }
}
