//! `dfgen info`: voxel statistics for a field file.

use std::path::Path;

use anyhow::{Context, Result};
use mesh_distfield::DistanceField;
use owo_colors::OwoColorize;

pub fn run(path: &Path, size: usize) -> Result<()> {
    let field = DistanceField::read_from(path, size)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let summary = field.summary();
    let total = field.len();

    println!("{}", path.display().bold());
    println!("  {:<12} {}³ = {total} voxels", "resolution".dimmed(), summary.resolution);
    println!("  {:<12} {} ({:.1}%)", "solid".dimmed(), summary.solid, percent(summary.solid, total));
    println!(
        "  {:<12} {} ({:.1}%)",
        "saturated".dimmed(),
        summary.saturated,
        percent(summary.saturated, total)
    );
    println!("  {:<12} {} .. {}", "bytes".dimmed(), summary.min, summary.max);
    if summary.solid == 0 {
        println!("{}", "⚠ No solid voxels; the mesh may be open.".yellow());
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}
