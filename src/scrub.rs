//! Repair of flagged halo pixels.
//!
//! Scrubbing replaces a contaminated pixel's color with the average of its
//! clean opaque neighbors, widening the search ring by ring when the
//! immediate neighborhood is itself contaminated or transparent. The alpha
//! channel is never touched.

use image::RgbaImage;

use crate::halo::HaloFlagSet;

/// Average the colors of clean donors on the Chebyshev ring of the given
/// radius around `(x, y)`. Donors are in-bounds pixels that are not flagged
/// and have alpha above zero.
fn ring_average(
    image: &RgbaImage,
    flags: &HaloFlagSet,
    x: u32,
    y: u32,
    radius: i64,
) -> Option<[u8; 3]> {
    let (width, height) = image.dimensions();
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx.abs().max(dy.abs()) != radius {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if flags.contains(&(nx, ny)) {
                continue;
            }
            let p = image.get_pixel(nx, ny);
            if p[3] == 0 {
                continue;
            }
            sum[0] += p[0] as u64;
            sum[1] += p[1] as u64;
            sum[2] += p[2] as u64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some([
        ((sum[0] + count / 2) / count) as u8,
        ((sum[1] + count / 2) / count) as u8,
        ((sum[2] + count / 2) / count) as u8,
    ])
}

/// Repair flagged coordinates in place.
///
/// Each flagged pixel takes the average color of non-flagged, alpha > 0
/// pixels in its immediate 8-neighborhood; when every neighbor is flagged
/// or transparent, the search expands ring by ring up to `search_radius`.
/// Flagged pixels never serve as donors, so repairs read original values
/// regardless of iteration order. Alpha is left untouched everywhere.
///
/// Returns the number of pixels that could not be repaired because no donor
/// was found within the search radius.
pub fn scrub(image: &mut RgbaImage, flags: &HaloFlagSet, search_radius: u32) -> usize {
    let mut unrepaired = 0;

    for &(x, y) in flags.iter() {
        let donor = (1..=search_radius as i64)
            .find_map(|radius| ring_average(image, flags, x, y, radius));

        match donor {
            Some(color) => {
                let p = image.get_pixel_mut(x, y);
                p[0] = color[0];
                p[1] = color[1];
                p[2] = color[2];
            }
            None => unrepaired += 1,
        }
    }

    unrepaired
}
