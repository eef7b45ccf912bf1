//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments for the strata driver.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Headless voxel terrain streaming driver")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Load radius in chunks.
    #[arg(long)]
    pub load_radius: Option<f32>,

    /// Unload radius in chunks.
    #[arg(long)]
    pub unload_radius: Option<f32>,

    /// Terrain generation threads (0 = auto).
    #[arg(long)]
    pub generation_threads: Option<usize>,

    /// Meshing threads (0 = auto).
    #[arg(long)]
    pub meshing_threads: Option<usize>,

    /// Generate a checkerboard instead of terrain.
    #[arg(long)]
    pub worst_case: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of observer steps the driver walks.
    #[arg(long, default_value_t = 8)]
    pub steps: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(r) = args.load_radius {
            self.streaming.load_radius = r;
        }
        if let Some(r) = args.unload_radius {
            self.streaming.unload_radius = r;
        }
        if let Some(n) = args.generation_threads {
            self.workers.generation_threads = n;
        }
        if let Some(n) = args.meshing_threads {
            self.workers.meshing_threads = n;
        }
        if args.worst_case {
            self.terrain.worst_case = true;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
