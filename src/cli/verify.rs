//! The `verify` subcommand: standalone halo checks on produced textures.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::cli::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::colorkey;
use crate::config::load_config;
use crate::halo;
use crate::output;

/// Execute the verify command
pub fn run_verify(
    inputs: &[PathBuf],
    key_arg: Option<&str>,
    tolerance: Option<u8>,
    config_path: Option<&Path>,
) -> ExitCode {
    if inputs.is_empty() {
        eprintln!("Error: no inputs given");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let rgb = match key_arg.map(colorkey::parse_key).transpose() {
        Ok(k) => k.unwrap_or(config.keying.key),
        Err(e) => {
            eprintln!("Error: invalid --key: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let key = colorkey::ColorKey::new(
        rgb,
        tolerance.unwrap_or(config.halo.tolerance),
        config.keying.metric,
    );

    let mut contaminated = 0usize;
    let mut unreadable = 0usize;

    for input in inputs {
        let texture = match output::load_texture(input) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: {}", e);
                unreadable += 1;
                continue;
            }
        };

        let flags = halo::find_halos(&texture, &key);
        if flags.is_empty() {
            println!("{}: clean", input.display());
        } else {
            println!("{}: {} contaminated pixels", input.display(), flags.len());
            contaminated += 1;
        }
    }

    if contaminated == 0 && unreadable == 0 {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
