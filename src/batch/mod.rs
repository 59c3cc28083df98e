//! Batch execution over independent textures
//!
//! Textures share no mutable state, so the batch is plain data parallelism:
//! a worker pool pulls textures off an atomic index, each worker runs the
//! full per-texture pipeline, and results are collected in input order. A
//! manifest in the output directory makes re-runs idempotent by skipping
//! textures whose source and output are unchanged.

pub mod manifest;
pub mod result;
pub mod runner;

pub use manifest::*;
pub use result::*;
pub use runner::*;
