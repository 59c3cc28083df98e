//! Alpha premultiplication and alpha plane extraction.
//!
//! Premultiplying color by alpha is what stops the color key from bleeding:
//! once every fully transparent pixel is forced to black, neighboring-pixel
//! interpolation inside the upscaler has no key color left to smear into
//! opaque edges.

use image::{GrayImage, Rgb, RgbImage, RgbaImage};

use crate::error::PipelineError;

/// Integer `round(c * a / 255)` without a division in the per-pixel loop.
#[inline]
fn mul_alpha(c: u8, a: u8) -> u8 {
    let n = c as u32 * a as u32;
    (((n + 128) * 257) >> 16) as u8
}

/// Premultiply a texture's color channels by an alpha mask.
///
/// For each pixel and channel: `p' = round(p * a / 255)`. At `a = 0` the
/// output is black regardless of the stored color, so the key value can
/// never survive into the premultiplied image. The texture's own fourth
/// channel is ignored; the mask is the authoritative alpha.
///
/// Fails with `DimensionMismatch` when mask and texture dimensions differ.
pub fn premultiply(texture: &RgbaImage, mask: &GrayImage) -> Result<RgbImage, PipelineError> {
    if texture.dimensions() != mask.dimensions() {
        return Err(PipelineError::dimension_mismatch(texture.dimensions(), mask.dimensions()));
    }

    let (width, height) = texture.dimensions();
    let out = RgbImage::from_fn(width, height, |x, y| {
        let a = mask.get_pixel(x, y)[0];
        if a == 0 {
            return Rgb([0, 0, 0]);
        }
        let p = texture.get_pixel(x, y);
        Rgb([mul_alpha(p[0], a), mul_alpha(p[1], a), mul_alpha(p[2], a)])
    });

    Ok(out)
}

/// Project the alpha mask as a standalone single-channel image.
///
/// Exists as a separable step so the alpha path can be resampled
/// independently of, and concurrently with, the color path.
pub fn split_alpha(mask: &GrayImage) -> GrayImage {
    mask.clone()
}
