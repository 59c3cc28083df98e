//! Color-key classification and alpha mask derivation.
//!
//! A color key is a reserved RGB value (usually pure magenta) that legacy
//! paletted formats use to mark transparent pixels. This module classifies
//! pixels against the key and derives a binary alpha mask from a key-coded
//! texture. Textures that already carry genuine partial alpha pass that
//! channel through untouched.

use image::{GrayImage, Luma, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance metric used to compare a pixel against the key color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Every channel must be within the tolerance of the key channel.
    #[default]
    PerChannel,
    /// Euclidean distance in RGB space must be within the tolerance.
    Euclidean,
}

/// A configured color key: the reserved RGB triple plus a tolerance radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorKey {
    /// The reserved RGB value.
    pub rgb: [u8; 3],
    /// Classification tolerance, in channel units.
    pub tolerance: u8,
    /// How pixel-to-key distance is measured.
    pub metric: DistanceMetric,
}

impl ColorKey {
    /// Create a key from an RGB triple and tolerance.
    pub fn new(rgb: [u8; 3], tolerance: u8, metric: DistanceMetric) -> Self {
        Self { rgb, tolerance, metric }
    }

    /// The conventional pure-magenta key.
    pub fn magenta(tolerance: u8) -> Self {
        Self::new([255, 0, 255], tolerance, DistanceMetric::PerChannel)
    }

    /// The same key with a different tolerance (e.g. the halo-detection
    /// tolerance instead of the keying tolerance).
    pub fn with_tolerance(self, tolerance: u8) -> Self {
        Self { tolerance, ..self }
    }

    /// Whether an RGB pixel lies within the tolerance of this key.
    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        match self.metric {
            DistanceMetric::PerChannel => {
                pixel.iter().zip(self.rgb.iter()).all(|(&p, &k)| p.abs_diff(k) <= self.tolerance)
            }
            DistanceMetric::Euclidean => {
                let dist_sq: u32 = pixel
                    .iter()
                    .zip(self.rgb.iter())
                    .map(|(&p, &k)| {
                        let d = p.abs_diff(k) as u32;
                        d * d
                    })
                    .sum();
                dist_sq <= (self.tolerance as u32) * (self.tolerance as u32)
            }
        }
    }
}

/// Error type for key string parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// Input string was empty
    #[error("empty key string")]
    Empty,
    /// Invalid length (must be 6 hex chars, with optional leading #)
    #[error("invalid key length {0}, expected 6 hex digits")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Parse an `RRGGBB` hex string (leading `#` optional) into an RGB triple.
pub fn parse_key(s: &str) -> Result<[u8; 3], KeyParseError> {
    if s.is_empty() {
        return Err(KeyParseError::Empty);
    }
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(KeyParseError::InvalidLength(hex.len()));
    }
    let r = parse_hex_pair(&hex[0..2])?;
    let g = parse_hex_pair(&hex[2..4])?;
    let b = parse_hex_pair(&hex[4..6])?;
    Ok([r, g, b])
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, KeyParseError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(KeyParseError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn parse_hex_pair(s: &str) -> Result<u8, KeyParseError> {
    let mut chars = s.chars();
    let high = parse_hex_digit(chars.next().ok_or(KeyParseError::Empty)?)?;
    let low = parse_hex_digit(chars.next().ok_or(KeyParseError::Empty)?)?;
    Ok(high * 16 + low)
}

/// Derive an alpha mask from a texture.
///
/// If the texture already carries genuine partial alpha (any pixel with
/// alpha below 255), that channel is the mask and key detection is skipped.
/// Otherwise each pixel is classified against the key: within tolerance is
/// transparent (0), everything else opaque (255).
///
/// A texture with zero key-colored pixels yields a fully opaque mask, which
/// is valid and not an error.
pub fn derive_mask(texture: &RgbaImage, key: &ColorKey) -> GrayImage {
    let (width, height) = texture.dimensions();

    if texture.pixels().any(|p| p[3] < 255) {
        return GrayImage::from_fn(width, height, |x, y| Luma([texture.get_pixel(x, y)[3]]));
    }

    GrayImage::from_fn(width, height, |x, y| {
        let p = texture.get_pixel(x, y);
        if key.matches([p[0], p[1], p[2]]) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
