//! texlift - Alpha-aware upscaling for color-keyed game textures
//!
//! Legacy paletted art marks transparency with a reserved "color key"
//! (usually pure magenta) instead of a real alpha channel. Feeding such
//! textures through a super-resolution model bleeds the key color into
//! opaque edges. This library provides the pipeline that prevents and
//! repairs that:
//! - Derive an alpha mask from the color key
//! - Premultiply color by alpha so transparent pixels cannot bleed
//! - Upscale the alpha plane independently with Lanczos resampling
//! - Recombine against the externally-upscaled color
//! - Verify edges for residual key contamination and scrub it out

pub mod batch;
pub mod cli;
pub mod colorkey;
pub mod config;
pub mod error;
pub mod halo;
pub mod output;
pub mod pipeline;
pub mod premultiply;
pub mod recombine;
pub mod resample;
pub mod scrub;
pub mod upscaler;
