//! The `upscale` subcommand: batch pipeline execution.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::batch::BatchRunner;
use crate::cli::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::colorkey;
use crate::config::{load_config, merge_cli_overrides, CliOverrides};

/// Parsed arguments for the `upscale` subcommand.
pub struct UpscaleArgs {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub scale: Option<u32>,
    pub jobs: Option<usize>,
    pub force: bool,
    pub key: Option<String>,
    pub tolerance: Option<u8>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Execute the upscale command
pub fn run_upscale(args: UpscaleArgs) -> ExitCode {
    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let key = match args.key.as_deref().map(colorkey::parse_key).transpose() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("Error: invalid --key: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let overrides =
        CliOverrides { scale: args.scale, key, tolerance: args.tolerance, jobs: args.jobs };
    merge_cli_overrides(&mut config, &overrides);

    let textures = match collect_inputs(&args.inputs) {
        Ok(t) => t,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    if textures.is_empty() {
        eprintln!("Error: no input textures found");
        return ExitCode::from(EXIT_ERROR);
    }

    let runner = BatchRunner::new(&config, args.output)
        .with_force(args.force)
        .with_verbose(args.verbose);

    let result = match runner.run(&textures) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("{}", result.summary());

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Expand the input arguments into an ordered texture list.
///
/// Directories are scanned for `*.png` in sorted order; plain files are
/// taken as given. A missing path is an argument error, not a per-texture
/// failure.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    if inputs.is_empty() {
        return Err("no inputs given".to_string());
    }

    let mut textures = Vec::new();
    for input in inputs {
        if input.is_dir() {
            textures.extend(scan_directory(input)?);
        } else if input.is_file() {
            textures.push(input.clone());
        } else {
            return Err(format!("input '{}' does not exist", input.display()));
        }
    }
    Ok(textures)
}

/// Collect `*.png` files from a directory in sorted order.
fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let pattern = dir.join("*.png");
    let pattern = pattern.to_str().ok_or_else(|| {
        format!("input directory '{}' is not valid UTF-8", dir.display())
    })?;

    let mut found: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| format!("invalid glob pattern '{}': {}", pattern, e))?
        .filter_map(Result::ok)
        .collect();
    found.sort();
    Ok(found)
}
