//! `dfgen render`: the viewer's per-pixel march, written to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use mesh_distfield::{render_depth, Atlas, Camera, DistanceField, MarchParams, Viewport};
use owo_colors::OwoColorize;
use tracing::info;

pub struct Options {
    pub field: PathBuf,
    pub size: usize,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub radius: f64,
    pub theta: f64,
    pub phi: f64,
    pub steps: u32,
}

pub fn run(options: &Options) -> Result<()> {
    let field = DistanceField::read_from(&options.field, options.size)
        .with_context(|| format!("Failed to load {}", options.field.display()))?;
    let atlas = Atlas::from_bytes(field.resolution(), field.into_bytes())?;

    let march = MarchParams::with_steps(options.steps);
    march.validate()?;
    let camera = Camera::orbit(options.radius, options.theta, options.phi);
    let viewport = Viewport::new(options.width, options.height);
    info!(
        width = options.width,
        height = options.height,
        steps = options.steps,
        "Rendering depth image"
    );

    let image = render_depth(&atlas, &camera, viewport, &march);
    std::fs::write(&options.output, image.to_f32_le_bytes())
        .with_context(|| format!("Failed to write {}", options.output.display()))?;

    println!("{}", "Depth image written".green().bold());
    println!("  {:<8} {}", "output".dimmed(), options.output.display());
    println!("  {:<8} {}x{} f32 LE, row 0 = bottom", "pixels".dimmed(), image.width(), image.height());
    if let Some((min, max)) = image.min_max() {
        println!("  {:<8} {min:.4} .. {max:.4}", "depth".dimmed());
    }
    Ok(())
}
