//! Per-texture pipeline driver.
//!
//! Runs one texture through the full stage sequence:
//! detect -> premultiply -> {alpha upscale, color upscale} -> recombine ->
//! verify -> scrub. The alpha and color paths are independent and run
//! concurrently; recombination joins them. A failure carries the stage it
//! happened in so the batch summary can attribute it.

use std::fmt;
use std::thread;

use image::RgbaImage;
use thiserror::Error;

use crate::colorkey;
use crate::config::TexliftConfig;
use crate::error::PipelineError;
use crate::halo;
use crate::premultiply;
use crate::recombine;
use crate::resample;
use crate::scrub;
use crate::upscaler::{ColorUpscaler, DevicePool};

/// Pipeline stage names, used for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Color-key detection / mask derivation
    Detect,
    /// Alpha premultiplication
    Premultiply,
    /// Lanczos upscale of the alpha plane
    AlphaUpscale,
    /// External color upscale of the premultiplied image
    ColorUpscale,
    /// Un-premultiply join of the two paths
    Recombine,
    /// Halo verification
    Verify,
    /// Halo scrubbing
    Scrub,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Detect => "detect",
            Stage::Premultiply => "premultiply",
            Stage::AlphaUpscale => "alpha-upscale",
            Stage::ColorUpscale => "color-upscale",
            Stage::Recombine => "recombine",
            Stage::Verify => "verify",
            Stage::Scrub => "scrub",
        };
        f.write_str(name)
    }
}

/// A pipeline error tagged with the stage it occurred in.
#[derive(Debug, Error)]
#[error("{stage}: {source}")]
pub struct StageError {
    /// Stage that failed
    pub stage: Stage,
    /// Underlying error
    #[source]
    pub source: PipelineError,
}

impl StageError {
    fn new(stage: Stage, source: PipelineError) -> Self {
        Self { stage, source }
    }
}

/// The result of running one texture through the pipeline.
#[derive(Debug)]
pub struct ProcessedTexture {
    /// Final RGBA texture at scaled dimensions.
    pub image: RgbaImage,
    /// Contaminated pixels still present after scrubbing. Zero for a clean
    /// texture; the batch compares this against the configured threshold.
    pub residual_flags: usize,
}

/// Run one texture through the full pipeline.
///
/// Pure with respect to the filesystem; loading and saving happen in the
/// batch layer. The device pool serializes the color-upscale stage across
/// concurrently processed textures.
pub fn process_texture(
    source: &RgbaImage,
    config: &TexliftConfig,
    upscaler: &dyn ColorUpscaler,
    devices: &DevicePool,
) -> Result<ProcessedTexture, StageError> {
    let factor = config.upscale.scale;
    let key = config.keying.color_key();

    let mask = colorkey::derive_mask(source, &key);

    let premultiplied = premultiply::premultiply(source, &mask)
        .map_err(|e| StageError::new(Stage::Premultiply, e))?;
    let alpha_plane = premultiply::split_alpha(&mask);

    // Fork: the alpha path runs on a scoped thread while the color path
    // waits for a device slot on this one. Recombination joins both.
    let (alpha_up, color_result) = thread::scope(|s| {
        let alpha_task = s.spawn(|| resample::upscale_gray(&alpha_plane, factor));

        let color_result = {
            let _slot = devices.acquire();
            upscaler.upscale(&premultiplied, factor)
        };

        match alpha_task.join() {
            Ok(alpha_up) => (alpha_up, color_result),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    let color_up = color_result.map_err(|e| StageError::new(Stage::ColorUpscale, e))?;

    let (width, height) = source.dimensions();
    let expected = (width * factor, height * factor);
    if color_up.dimensions() != expected {
        return Err(StageError::new(
            Stage::ColorUpscale,
            PipelineError::upscale_dimension_mismatch(expected, color_up.dimensions()),
        ));
    }

    let mut recombined = recombine::recombine(&color_up, &alpha_up)
        .map_err(|e| StageError::new(Stage::Recombine, e))?;

    let halo_key = key.with_tolerance(config.halo.tolerance);
    let flags = halo::find_halos(&recombined, &halo_key);

    if !flags.is_empty() {
        scrub::scrub(&mut recombined, &flags, config.scrub.search_radius);
    }

    let residual_flags = halo::find_halos(&recombined, &halo_key).len();

    Ok(ProcessedTexture { image: recombined, residual_flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpscaleBackend;
    use crate::upscaler::create_upscaler;
    use image::{RgbImage, Rgba};

    fn magenta_bg_texture() -> RgbaImage {
        // 4x4 opaque white square centered in an 8x8 magenta-keyed field.
        let mut texture = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 255, 255]));
        for y in 2..6 {
            for x in 2..6 {
                texture.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        texture
    }

    #[test]
    fn test_full_pipeline_output_dimensions() {
        let config = TexliftConfig::default();
        let upscaler = create_upscaler(UpscaleBackend::Nearest);
        let devices = DevicePool::new(&config.upscale.devices);

        let result =
            process_texture(&magenta_bg_texture(), &config, upscaler.as_ref(), &devices).unwrap();
        assert_eq!(result.image.dimensions(), (32, 32));
    }

    #[test]
    fn test_premultiplied_pipeline_leaves_no_halos() {
        // Premultiplication removes the key before the color path ever runs,
        // so even a filtering color backend cannot smear it back in.
        let config = TexliftConfig::default();
        let upscaler = create_upscaler(UpscaleBackend::Lanczos);
        let devices = DevicePool::new(&config.upscale.devices);

        let result =
            process_texture(&magenta_bg_texture(), &config, upscaler.as_ref(), &devices).unwrap();
        assert_eq!(result.residual_flags, 0);

        let halo_key = config.keying.color_key().with_tolerance(config.halo.tolerance);
        for p in result.image.pixels() {
            if p[3] > 0 {
                assert!(!halo_key.matches([p[0], p[1], p[2]]));
            }
        }
    }

    #[test]
    fn test_transparent_region_is_black() {
        let config = TexliftConfig::default();
        let upscaler = create_upscaler(UpscaleBackend::Nearest);
        let devices = DevicePool::new(&config.upscale.devices);

        let result =
            process_texture(&magenta_bg_texture(), &config, upscaler.as_ref(), &devices).unwrap();
        for p in result.image.pixels() {
            if p[3] == 0 {
                assert_eq!([p[0], p[1], p[2]], [0, 0, 0]);
            }
        }
    }

    #[test]
    fn test_dimension_contract_violation_is_caught() {
        struct ShortUpscaler;
        impl ColorUpscaler for ShortUpscaler {
            fn name(&self) -> &'static str {
                "short"
            }
            fn upscale(&self, image: &RgbImage, factor: u32) -> Result<RgbImage, PipelineError> {
                // Off-by-one height violates the contract.
                let (w, h) = image.dimensions();
                Ok(RgbImage::new(w * factor, h * factor - 1))
            }
        }

        let config = TexliftConfig::default();
        let devices = DevicePool::new(&[]);
        let err = process_texture(&magenta_bg_texture(), &config, &ShortUpscaler, &devices)
            .unwrap_err();

        assert_eq!(err.stage, Stage::ColorUpscale);
        assert!(matches!(err.source, PipelineError::UpscaleDimensionMismatch { .. }));
    }

    #[test]
    fn test_backend_failure_is_attributed() {
        struct FailingUpscaler;
        impl ColorUpscaler for FailingUpscaler {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn upscale(&self, _: &RgbImage, _: u32) -> Result<RgbImage, PipelineError> {
                Err(PipelineError::Upscaler("device lost".to_string()))
            }
        }

        let config = TexliftConfig::default();
        let devices = DevicePool::new(&[]);
        let err = process_texture(&magenta_bg_texture(), &config, &FailingUpscaler, &devices)
            .unwrap_err();

        assert_eq!(err.stage, Stage::ColorUpscale);
        assert_eq!(err.to_string(), "color-upscale: color upscaler failed: device lost");
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Detect.to_string(), "detect");
        assert_eq!(Stage::AlphaUpscale.to_string(), "alpha-upscale");
        assert_eq!(Stage::ColorUpscale.to_string(), "color-upscale");
    }
}
