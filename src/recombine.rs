//! Recombination of the upscaled color and alpha paths.
//!
//! The numeric inverse of premultiplication, applied after the two signals
//! were resampled independently: dividing the upscaled color by the
//! upscaled alpha recovers full-intensity color at partially transparent
//! edge pixels that premultiplication had darkened.

use image::{GrayImage, RgbImage, Rgba, RgbaImage};

use crate::error::PipelineError;

/// Integer `min(255, round(c * 255 / a))` for `a > 0`.
///
/// Independent resampling can leave `c > a`, so the quotient must be
/// clamped on the way back to u8.
#[inline]
fn unmul_alpha(c: u8, a: u8) -> u8 {
    let a = a as u32;
    let v = (c as u32 * 255 + a / 2) / a;
    v.min(255) as u8
}

/// Un-premultiply upscaled color against upscaled alpha into the final RGBA.
///
/// At `alpha == 0` the output pixel is fully transparent black; the alpha
/// channel is exactly the alpha path's output and is never adjusted here.
/// Fails with `DimensionMismatch` when the two inputs disagree.
pub fn recombine(color: &RgbImage, alpha: &GrayImage) -> Result<RgbaImage, PipelineError> {
    if color.dimensions() != alpha.dimensions() {
        return Err(PipelineError::dimension_mismatch(color.dimensions(), alpha.dimensions()));
    }

    let (width, height) = color.dimensions();
    let out = RgbaImage::from_fn(width, height, |x, y| {
        let a = alpha.get_pixel(x, y)[0];
        if a == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let c = color.get_pixel(x, y);
        Rgba([unmul_alpha(c[0], a), unmul_alpha(c[1], a), unmul_alpha(c[2], a), a])
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_zero_alpha_is_transparent_black() {
        let color = RgbImage::from_pixel(2, 2, Rgb([120, 90, 200]));
        let alpha = GrayImage::from_pixel(2, 2, Luma([0]));

        let out = recombine(&color, &alpha).unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_full_alpha_is_identity() {
        let color = RgbImage::from_pixel(2, 2, Rgb([120, 90, 200]));
        let alpha = GrayImage::from_pixel(2, 2, Luma([255]));

        let out = recombine(&color, &alpha).unwrap();
        assert!(out.pixels().all(|p| p.0 == [120, 90, 200, 255]));
    }

    #[test]
    fn test_partial_alpha_recovers_intensity() {
        // Premultiplied half-intensity white at alpha 128 recovers to white.
        let color = RgbImage::from_pixel(1, 1, Rgb([128, 128, 128]));
        let alpha = GrayImage::from_pixel(1, 1, Luma([128]));

        let out = recombine(&color, &alpha).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 128]);
    }

    #[test]
    fn test_quotient_above_one_clamps() {
        // Resampling can leave color exceeding alpha; the quotient clamps
        // instead of overflowing.
        let color = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let alpha = GrayImage::from_pixel(1, 1, Luma([1]));

        let out = recombine(&color, &alpha).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 1]);
    }

    #[test]
    fn test_alpha_channel_copied_verbatim() {
        let color = RgbImage::from_pixel(3, 1, Rgb([10, 10, 10]));
        let mut alpha = GrayImage::new(3, 1);
        alpha.put_pixel(0, 0, Luma([0]));
        alpha.put_pixel(1, 0, Luma([77]));
        alpha.put_pixel(2, 0, Luma([255]));

        let out = recombine(&color, &alpha).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0)[3], 77);
        assert_eq!(out.get_pixel(2, 0)[3], 255);
    }

    #[test]
    fn test_dimension_mismatch() {
        let color = RgbImage::new(4, 4);
        let alpha = GrayImage::new(5, 4);

        let err = recombine(&color, &alpha).unwrap_err();
        assert!(matches!(err, PipelineError::DimensionMismatch { .. }));
    }
}
