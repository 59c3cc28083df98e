//! Configuration loading and discovery for `texlift.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::TexliftConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse texlift.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override scale factor
    pub scale: Option<u32>,
    /// Override color key
    pub key: Option<[u8; 3]>,
    /// Override keying tolerance
    pub tolerance: Option<u8>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
}

/// Find texlift.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for texlift.toml
/// 2. Check XDG_CONFIG_HOME/texlift/texlift.toml (or ~/.config/texlift/texlift.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find texlift.toml in XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("texlift").join("texlift.toml");
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find texlift.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join("texlift.toml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a texlift.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses
/// `find_config()` to locate the config file. If no config file is found,
/// returns the default configuration.
pub fn load_config(path: Option<&Path>) -> Result<TexliftConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(TexliftConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<TexliftConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: TexliftConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut TexliftConfig, overrides: &CliOverrides) {
    if let Some(scale) = overrides.scale {
        config.upscale.scale = scale;
    }

    if let Some(key) = overrides.key {
        config.keying.key = key;
    }

    if let Some(tolerance) = overrides.tolerance {
        config.keying.tolerance = tolerance;
    }

    if let Some(jobs) = overrides.jobs {
        config.batch.jobs = jobs;
    }
}
