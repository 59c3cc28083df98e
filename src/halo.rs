//! Residual halo detection on recombined textures.
//!
//! A halo is the color key bleeding into the edge of an otherwise opaque
//! shape. Only alpha-transition pixels are checked: interior opaque regions
//! of key-colored source art are legitimate (an artist can draw a magenta
//! object), while key color sitting on a transparency boundary is a
//! resampling artifact.

use std::collections::HashSet;

use image::RgbaImage;

use crate::colorkey::ColorKey;

/// Coordinates in a recombined texture suspected of key contamination.
pub type HaloFlagSet = HashSet<(u32, u32)>;

/// Whether any pixel in the 8-neighborhood has a different alpha value.
fn on_alpha_transition(image: &RgbaImage, x: u32, y: u32) -> bool {
    let (width, height) = image.dimensions();
    let alpha = image.get_pixel(x, y)[3];

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }
            if image.get_pixel(nx as u32, ny as u32)[3] != alpha {
                return true;
            }
        }
    }
    false
}

/// Scan a recombined texture for key contamination near transparency
/// boundaries.
///
/// A coordinate is flagged when its alpha is above zero, its color lies
/// within the key tolerance, and at least one 8-neighbor has a different
/// alpha value. Reports only; the image is not mutated. An empty set is the
/// expected result for a clean texture.
pub fn find_halos(image: &RgbaImage, key: &ColorKey) -> HaloFlagSet {
    let mut flags = HaloFlagSet::new();

    for (x, y, p) in image.enumerate_pixels() {
        if p[3] == 0 {
            continue;
        }
        if !key.matches([p[0], p[1], p[2]]) {
            continue;
        }
        if on_alpha_transition(image, x, y) {
            flags.insert((x, y));
        }
    }

    flags
}
