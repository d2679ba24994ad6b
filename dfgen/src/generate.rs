//! `dfgen generate`: mesh file in, field file out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mesh_distfield::{generate_to_file, ClassifierKind, GenerationParams};
use owo_colors::OwoColorize;
use tracing::info;

pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub size: Option<usize>,
    pub classifier: Option<ClassifierKind>,
    pub params: Option<PathBuf>,
}

pub fn run(options: &Options) -> Result<()> {
    let params = resolve_params(options)?;

    let meshes = mesh_io::load_meshes(&options.input)
        .with_context(|| format!("Failed to import {}", options.input.display()))?;
    info!(meshes = meshes.len(), path = %options.input.display(), "Imported");

    let generated = generate_to_file(&meshes, &params, &options.output)
        .with_context(|| format!("Failed to generate {}", options.output.display()))?;

    let stats = generated.stats;
    println!();
    println!("{}", "Distance field written".green().bold());
    println!("  {:<12} {}", "output".dimmed(), options.output.display());
    println!("  {:<12} {}³ = {} bytes", "resolution".dimmed(), params.resolution, generated.field.len());
    println!("  {:<12} {:?}", "classifier".dimmed(), params.classifier);
    println!("  {:<12} {}", "inside".dimmed(), stats.inside);
    println!("  {:<12} {}", "outside".dimmed(), stats.outside);
    println!("  {:<12} {}", "saturated".dimmed(), stats.saturated);
    println!(
        "  {:<12} {} nodes, depth {}",
        "index".dimmed(),
        generated.index_stats.node_count,
        generated.index_stats.max_depth
    );
    Ok(())
}

/// Defaults, then the JSON file, then explicit flags.
fn resolve_params(options: &Options) -> Result<GenerationParams> {
    let mut params = match &options.params {
        Some(path) => read_params(path)?,
        None => GenerationParams::default(),
    };
    if let Some(size) = options.size {
        params.resolution = size;
    }
    if let Some(classifier) = options.classifier {
        params.classifier = classifier;
    }
    Ok(params)
}

fn read_params(path: &Path) -> Result<GenerationParams> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid parameters in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(params: Option<PathBuf>) -> Options {
        Options {
            input: PathBuf::from("in.stl"),
            output: PathBuf::from("out.bin"),
            size: None,
            classifier: None,
            params,
        }
    }

    #[test]
    fn defaults_without_flags() -> Result<()> {
        let params = resolve_params(&options(None))?;
        assert_eq!(params, GenerationParams::default());
        Ok(())
    }

    #[test]
    fn flags_override_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "resolution": 16, "classifier": "winding-number", "leaf_size": 8 }"#)?;

        let from_file = resolve_params(&options(Some(path.clone())))?;
        assert_eq!(from_file.resolution, 16);
        assert_eq!(from_file.leaf_size, 8);
        assert_eq!(from_file.classifier, ClassifierKind::WindingNumber);

        let mut overridden = options(Some(path));
        overridden.size = Some(40);
        overridden.classifier = Some(ClassifierKind::RayParity);
        let params = resolve_params(&overridden)?;
        assert_eq!(params.resolution, 40);
        assert_eq!(params.leaf_size, 8);
        assert_eq!(params.classifier, ClassifierKind::RayParity);
        Ok(())
    }

    #[test]
    fn malformed_json_is_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("params.json");
        std::fs::write(&path, "{ resolution: ")?;
        assert!(resolve_params(&options(Some(path))).is_err());
        Ok(())
    }
}
