//! Command-line front end for mesh distance fields.
//!
//! # Commands
//!
//! - `dfgen generate -i mesh.stl -o field.bin` - sample a mesh into an `N³` byte field
//! - `dfgen render -f field.bin -o depth.bin` - sphere trace the field into a depth buffer
//! - `dfgen info -f field.bin` - summarize a field file
//!
//! Logging goes through `tracing`; set `RUST_LOG` to override the level.

mod generate;
mod info;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mesh_distfield::{ClassifierKind, DEFAULT_MARCH_STEPS, DEFAULT_RESOLUTION};
use tracing_subscriber::EnvFilter;

/// Quantized distance field generator and viewer.
#[derive(Parser)]
#[command(name = "dfgen")]
#[command(about = "Generate and inspect quantized mesh distance fields", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug detail (index statistics, per-stage timings)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a closed mesh into a field file of exactly N³ bytes
    Generate {
        /// Input mesh (STL or OBJ)
        #[arg(short, long)]
        input: PathBuf,

        /// Output field file
        #[arg(short, long)]
        output: PathBuf,

        /// Grid resolution N
        #[arg(short, long)]
        size: Option<usize>,

        /// Inside/outside test
        #[arg(long, value_enum)]
        classifier: Option<Classifier>,

        /// JSON file with generation parameters; explicit flags win
        #[arg(long)]
        params: Option<PathBuf>,
    },

    /// March one ray per pixel and write raw f32 little-endian depths
    Render {
        /// Field file produced by `generate`
        #[arg(short, long)]
        field: PathBuf,

        /// Grid resolution N the field was generated with
        #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
        size: usize,

        /// Output depth buffer
        #[arg(short, long)]
        output: PathBuf,

        /// Image width in pixels
        #[arg(long, default_value_t = 1280)]
        width: usize,

        /// Image height in pixels
        #[arg(long, default_value_t = 720)]
        height: usize,

        /// Orbit radius around the cube center
        #[arg(long, default_value_t = mesh_distfield::Camera::DEFAULT_RADIUS)]
        radius: f64,

        /// Polar angle from +z, in radians
        #[arg(long, default_value_t = mesh_distfield::Camera::DEFAULT_THETA, allow_negative_numbers = true)]
        theta: f64,

        /// Azimuth around +z, in radians
        #[arg(long, default_value_t = mesh_distfield::Camera::DEFAULT_PHI, allow_negative_numbers = true)]
        phi: f64,

        /// Sphere tracing steps per ray
        #[arg(long, default_value_t = DEFAULT_MARCH_STEPS)]
        steps: u32,
    },

    /// Print voxel statistics for a field file
    Info {
        /// Field file produced by `generate`
        #[arg(short, long)]
        field: PathBuf,

        /// Grid resolution N the field was generated with
        #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
        size: usize,
    },
}

/// Command-line spelling of [`ClassifierKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Classifier {
    /// Majority vote of three ray parity tests
    RayParity,
    /// Generalized winding number
    WindingNumber,
}

impl From<Classifier> for ClassifierKind {
    fn from(value: Classifier) -> Self {
        match value {
            Classifier::RayParity => Self::RayParity,
            Classifier::WindingNumber => Self::WindingNumber,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            output,
            size,
            classifier,
            params,
        } => generate::run(&generate::Options {
            input,
            output,
            size,
            classifier: classifier.map(ClassifierKind::from),
            params,
        }),
        Commands::Render {
            field,
            size,
            output,
            width,
            height,
            radius,
            theta,
            phi,
            steps,
        } => render::run(&render::Options {
            field,
            size,
            output,
            width,
            height,
            radius,
            theta,
            phi,
            steps,
        }),
        Commands::Info { field, size } => info::run(&field, size),
    }
}
