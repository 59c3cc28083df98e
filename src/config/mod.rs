//! Configuration for the upscaling pipeline
//!
//! Provides the `texlift.toml` schema, discovery, loading, and CLI override
//! merging.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
