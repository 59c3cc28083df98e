//! Separable Lanczos resampling for single-channel and RGB planes.
//!
//! The alpha plane defines where color bleed is visually possible, so it is
//! resampled with a sharp, ringing-tolerant filter rather than bilinear or
//! bicubic: Lanczos with support radius 3. Overshoot from the negative
//! lobes is clamped back to [0, 255] on output. Out-of-bounds taps clamp to
//! the nearest edge pixel; wraparound or zero padding would darken or
//! lighten edges spuriously.

use image::{GrayImage, RgbImage};

/// Lanczos support radius.
const SUPPORT: f32 = 3.0;

/// The Lanczos-3 kernel: `sinc(x) * sinc(x / 3)` for |x| < 3, else 0.
fn lanczos3(x: f32) -> f32 {
    let x = x.abs();
    if x < 1e-7 {
        return 1.0;
    }
    if x >= SUPPORT {
        return 0.0;
    }
    let pix = std::f32::consts::PI * x;
    SUPPORT * pix.sin() * (pix / SUPPORT).sin() / (pix * pix)
}

/// Filter taps for one output coordinate: clamped source indices paired
/// with normalized weights.
struct TapSet {
    taps: Vec<(usize, f32)>,
}

/// Precompute the tap sets for resampling one axis from `src_len` to
/// `src_len * factor` samples.
fn axis_taps(src_len: u32, factor: u32) -> Vec<TapSet> {
    let dst_len = src_len * factor;
    let scale = factor as f32;
    let max_index = src_len.saturating_sub(1) as i64;

    (0..dst_len)
        .map(|dst| {
            // Pixel-center mapping between the two grids.
            let center = (dst as f32 + 0.5) / scale - 0.5;
            let lo = (center - SUPPORT).ceil() as i64;
            let hi = (center + SUPPORT).floor() as i64;

            let mut taps = Vec::with_capacity((hi - lo + 1) as usize);
            let mut total = 0.0f32;
            for tap in lo..=hi {
                let weight = lanczos3(tap as f32 - center);
                if weight == 0.0 {
                    continue;
                }
                total += weight;
                let index = tap.clamp(0, max_index) as usize;
                taps.push((index, weight));
            }
            for (_, weight) in &mut taps {
                *weight /= total;
            }
            TapSet { taps }
        })
        .collect()
}

/// Resample one u8 plane to `factor` times its dimensions.
///
/// Two separable passes: horizontal into an f32 intermediate, then vertical
/// with clamping back to u8 on the final store.
fn upscale_plane(src: &[u8], width: u32, height: u32, factor: u32) -> Vec<u8> {
    let out_w = (width * factor) as usize;
    let out_h = (height * factor) as usize;
    let width = width as usize;
    let taps_x = axis_taps(width as u32, factor);
    let taps_y = axis_taps(height, factor);

    let mut horizontal = vec![0.0f32; out_w * height as usize];
    for y in 0..height as usize {
        let row = &src[y * width..(y + 1) * width];
        let out_row = &mut horizontal[y * out_w..(y + 1) * out_w];
        for (ox, tap_set) in taps_x.iter().enumerate() {
            let mut acc = 0.0f32;
            for &(index, weight) in &tap_set.taps {
                acc += row[index] as f32 * weight;
            }
            out_row[ox] = acc;
        }
    }

    let mut out = vec![0u8; out_w * out_h];
    for (oy, tap_set) in taps_y.iter().enumerate() {
        for ox in 0..out_w {
            let mut acc = 0.0f32;
            for &(index, weight) in &tap_set.taps {
                acc += horizontal[index * out_w + ox] * weight;
            }
            out[oy * out_w + ox] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Upscale a single-channel image by an integer factor.
///
/// Deterministic given the input and factor; at factor 1 the output equals
/// the input up to filter rounding.
pub fn upscale_gray(src: &GrayImage, factor: u32) -> GrayImage {
    let (width, height) = src.dimensions();
    let pixels = upscale_plane(src.as_raw(), width, height, factor);
    GrayImage::from_raw(width * factor, height * factor, pixels)
        .expect("plane length matches scaled dimensions")
}

/// Upscale an RGB image by an integer factor, resampling each channel as an
/// independent plane.
pub fn upscale_rgb(src: &RgbImage, factor: u32) -> RgbImage {
    let (width, height) = src.dimensions();
    let npix = (width * height) as usize;
    let raw = src.as_raw();

    let mut planes = [vec![0u8; npix], vec![0u8; npix], vec![0u8; npix]];
    for i in 0..npix {
        planes[0][i] = raw[3 * i];
        planes[1][i] = raw[3 * i + 1];
        planes[2][i] = raw[3 * i + 2];
    }

    let scaled: Vec<Vec<u8>> =
        planes.iter().map(|plane| upscale_plane(plane, width, height, factor)).collect();

    let out_npix = scaled[0].len();
    let mut interleaved = vec![0u8; 3 * out_npix];
    for i in 0..out_npix {
        interleaved[3 * i] = scaled[0][i];
        interleaved[3 * i + 1] = scaled[1][i];
        interleaved[3 * i + 2] = scaled[2][i];
    }

    RgbImage::from_raw(width * factor, height * factor, interleaved)
        .expect("plane length matches scaled dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_kernel_center_and_support() {
        assert!((lanczos3(0.0) - 1.0).abs() < 1e-6);
        assert_eq!(lanczos3(3.0), 0.0);
        assert_eq!(lanczos3(-4.5), 0.0);
        // Integer offsets sit on sinc zeros.
        assert!(lanczos3(1.0).abs() < 1e-6);
        assert!(lanczos3(2.0).abs() < 1e-6);
    }

    #[test]
    fn test_identity_at_factor_one() {
        let mut src = GrayImage::new(5, 4);
        for (x, y, p) in src.enumerate_pixels_mut() {
            *p = Luma([(x * 37 + y * 91) as u8]);
        }

        let out = upscale_gray(&src, 1);
        assert_eq!(out.dimensions(), (5, 4));
        for (x, y, p) in out.enumerate_pixels() {
            let original = src.get_pixel(x, y)[0];
            assert!(p[0].abs_diff(original) <= 1, "pixel ({}, {}) drifted", x, y);
        }
    }

    #[test]
    fn test_output_dimensions() {
        let src = GrayImage::new(8, 6);
        let out = upscale_gray(&src, 4);
        assert_eq!(out.dimensions(), (32, 24));
    }

    #[test]
    fn test_flat_plane_stays_flat() {
        // Normalized weights mean a constant input cannot ring.
        let src = GrayImage::from_pixel(6, 6, Luma([180]));
        let out = upscale_gray(&src, 3);
        assert!(out.pixels().all(|p| p[0] == 180));
    }

    #[test]
    fn test_ringing_is_clamped() {
        // A hard black/white edge overshoots with Lanczos; the overshoot
        // must be clamped, never wrapped.
        let mut src = GrayImage::from_pixel(8, 1, Luma([0]));
        for x in 4..8 {
            src.put_pixel(x, 0, Luma([255]));
        }

        let out = upscale_gray(&src, 4);
        for p in out.pixels() {
            // The u8 type enforces the range; the property worth checking
            // is that edge values reach the extremes without artifacts.
            let v = p[0];
            assert!(v <= 255);
        }
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(31, 0)[0], 255);
    }

    #[test]
    fn test_edge_taps_clamp_not_wrap() {
        // With wraparound, the white right edge would leak into the left
        // output pixels. Clamping keeps the left edge fully black.
        let mut src = GrayImage::from_pixel(8, 1, Luma([0]));
        src.put_pixel(7, 0, Luma([255]));

        let out = upscale_gray(&src, 4);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_rgb_channels_resampled_independently() {
        let mut src = RgbImage::from_pixel(4, 4, image::Rgb([200, 0, 0]));
        for y in 0..4 {
            src.put_pixel(3, y, image::Rgb([200, 0, 255]));
        }

        let out = upscale_rgb(&src, 2);
        assert_eq!(out.dimensions(), (8, 8));
        // Red is constant everywhere; blue varies only near the right edge.
        assert!(out.pixels().all(|p| p[0] == 200 && p[1] == 0));
        assert_eq!(out.get_pixel(0, 0)[2], 0);
        assert_eq!(out.get_pixel(7, 0)[2], 255);
    }
}
