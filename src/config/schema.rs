//! Configuration schema types for `texlift.toml`
//!
//! Defines the structure and validation rules for pipeline configuration.
//! Stages receive these values explicitly; nothing reads ambient state.

use serde::{Deserialize, Serialize};

use crate::colorkey::{ColorKey, DistanceMetric};

/// Color upscaler backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleBackend {
    /// CPU Lanczos fallback
    #[default]
    Lanczos,
    /// Nearest-neighbor echo (pixel art, testing)
    Nearest,
}

/// Color-key classification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyingConfig {
    /// Reserved transparent RGB value
    #[serde(default = "default_key")]
    pub key: [u8; 3],
    /// Classification tolerance in channel units
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
    /// Distance metric for key comparison
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl Default for KeyingConfig {
    fn default() -> Self {
        Self { key: default_key(), tolerance: default_tolerance(), metric: DistanceMetric::default() }
    }
}

impl KeyingConfig {
    /// The configured key as a `ColorKey` value.
    pub fn color_key(&self) -> ColorKey {
        ColorKey::new(self.key, self.tolerance, self.metric)
    }
}

fn default_key() -> [u8; 3] {
    [255, 0, 255]
}

fn default_tolerance() -> u8 {
    20
}

/// Upscaling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpscaleConfig {
    /// Uniform integer scale factor
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Color upscaler backend
    #[serde(default)]
    pub backend: UpscaleBackend,
    /// Accelerator device ids for round-robin sharding; empty means a
    /// single CPU slot
    #[serde(default)]
    pub devices: Vec<u32>,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self { scale: default_scale(), backend: UpscaleBackend::default(), devices: Vec::new() }
    }
}

fn default_scale() -> u32 {
    4
}

/// Halo detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaloConfig {
    /// Detection tolerance against the key, in channel units
    #[serde(default = "default_tolerance")]
    pub tolerance: u8,
    /// Post-scrub flags tolerated before a texture is marked for review
    #[serde(default)]
    pub max_flags: usize,
}

impl Default for HaloConfig {
    fn default() -> Self {
        Self { tolerance: default_tolerance(), max_flags: 0 }
    }
}

/// Scrubbing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Expanding donor-search radius cap, in pixels
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self { search_radius: default_search_radius() }
    }
}

fn default_search_radius() -> u32 {
    8
}

/// Batch execution settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchConfig {
    /// Worker count; 0 means available parallelism
    #[serde(default)]
    pub jobs: usize,
}

/// Complete texlift.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TexliftConfig {
    /// Color-key settings
    #[serde(default)]
    pub keying: KeyingConfig,
    /// Upscaling settings
    #[serde(default)]
    pub upscale: UpscaleConfig,
    /// Halo detection settings
    #[serde(default)]
    pub halo: HaloConfig,
    /// Scrubbing settings
    #[serde(default)]
    pub scrub: ScrubConfig,
    /// Batch execution settings
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "upscale.scale")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "texlift.toml: '{}' {}", self.field, self.message)
    }
}

impl TexliftConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.upscale.scale == 0 {
            errors.push(ConfigValidationError {
                field: "upscale.scale".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if self.scrub.search_radius == 0 {
            errors.push(ConfigValidationError {
                field: "scrub.search_radius".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for device in &self.upscale.devices {
            if !seen.insert(device) {
                errors.push(ConfigValidationError {
                    field: "upscale.devices".to_string(),
                    message: format!("device {} listed more than once", device),
                });
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
