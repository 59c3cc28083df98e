//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub mod upscale;
pub mod verify;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// texlift - Alpha-aware upscaling for color-keyed game textures
#[derive(Parser)]
#[command(name = "texlift")]
#[command(about = "Alpha-aware upscaling for color-keyed game textures")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upscale a batch of textures
    Upscale {
        /// Input texture files or directories (directories are scanned for *.png)
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Scale factor (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=16))]
        scale: Option<u32>,

        /// Number of parallel jobs (overrides config)
        #[arg(long)]
        jobs: Option<usize>,

        /// Reprocess textures even when the manifest says they are up to date
        #[arg(long)]
        force: bool,

        /// Color key as RRGGBB hex (overrides config)
        #[arg(long)]
        key: Option<String>,

        /// Keying tolerance in channel units (overrides config)
        #[arg(long)]
        tolerance: Option<u8>,

        /// Path to texlift.toml (otherwise discovered by walking up)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print per-texture progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check already-produced RGBA textures for residual halo contamination
    Verify {
        /// Texture files to check
        inputs: Vec<PathBuf>,

        /// Color key as RRGGBB hex (overrides config)
        #[arg(long)]
        key: Option<String>,

        /// Detection tolerance in channel units (overrides config)
        #[arg(long)]
        tolerance: Option<u8>,

        /// Path to texlift.toml (otherwise discovered by walking up)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Upscale {
            inputs,
            output,
            scale,
            jobs,
            force,
            key,
            tolerance,
            config,
            verbose,
        } => upscale::run_upscale(upscale::UpscaleArgs {
            inputs,
            output,
            scale,
            jobs,
            force,
            key,
            tolerance,
            config,
            verbose,
        }),
        Commands::Verify { inputs, key, tolerance, config } => {
            verify::run_verify(&inputs, key.as_deref(), tolerance, config.as_deref())
        }
    }
}
