//! Per-texture pipeline errors.
//!
//! Every error is attributable to a single texture; the batch layer catches
//! them at the texture boundary and keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised by a pipeline stage while processing one texture.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Two inputs to a stage were expected to share dimensions but do not.
    #[error("dimension mismatch: expected {expected_w}x{expected_h}, found {found_w}x{found_h}")]
    DimensionMismatch { expected_w: u32, expected_h: u32, found_w: u32, found_h: u32 },

    /// The external color upscaler returned dimensions inconsistent with
    /// `(W*N)x(H*N)`.
    #[error("upscaler returned {found_w}x{found_h}, expected {expected_w}x{expected_h}")]
    UpscaleDimensionMismatch { expected_w: u32, expected_h: u32, found_w: u32, found_h: u32 },

    /// The raw raster could not be decoded into a valid pixel grid.
    #[error("corrupt input '{}': {}", .path.display(), .source)]
    CorruptInput {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Post-scrub verification still found contaminated pixels above the
    /// configured threshold. The texture output is still emitted; the batch
    /// marks it for manual review instead of failing it.
    #[error("{flags} contaminated pixels remain after scrubbing")]
    HaloResidual { flags: usize },

    /// The color upscaler backend itself failed.
    #[error("color upscaler failed: {0}")]
    Upscaler(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Build a `DimensionMismatch` from two `(width, height)` pairs.
    pub fn dimension_mismatch(expected: (u32, u32), found: (u32, u32)) -> Self {
        PipelineError::DimensionMismatch {
            expected_w: expected.0,
            expected_h: expected.1,
            found_w: found.0,
            found_h: found.1,
        }
    }

    /// Build an `UpscaleDimensionMismatch` from two `(width, height)` pairs.
    pub fn upscale_dimension_mismatch(expected: (u32, u32), found: (u32, u32)) -> Self {
        PipelineError::UpscaleDimensionMismatch {
            expected_w: expected.0,
            expected_h: expected.1,
            found_w: found.0,
            found_h: found.1,
        }
    }
}
