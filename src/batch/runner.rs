//! Parallel batch execution.
//!
//! Textures are independent, so the runner is a flat worker pool: scoped
//! threads pull source paths off a shared atomic index, run the per-texture
//! pipeline, and push results that are re-sorted into input order at the
//! end. One texture failing is recorded and the batch moves on; killing the
//! batch midway leaves every already-written output valid.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use thiserror::Error;

use crate::batch::{BatchManifest, BatchResult, TextureResult, TextureStatus};
use crate::config::TexliftConfig;
use crate::output;
use crate::pipeline;
use crate::upscaler::{create_upscaler, DevicePool};

/// Error that aborts the batch before any texture runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    /// Output directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Manifest could not be written
    #[error("manifest error: {0}")]
    Manifest(#[from] crate::batch::ManifestError),
}

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Parallel batch executor.
pub struct BatchRunner<'a> {
    /// Pipeline configuration
    config: &'a TexliftConfig,
    /// Output directory
    out_dir: PathBuf,
    /// Number of parallel jobs
    jobs: usize,
    /// Whether to reprocess textures the manifest says are up to date
    force: bool,
    /// Whether to print per-texture progress
    verbose: bool,
}

impl<'a> BatchRunner<'a> {
    /// Create a new batch runner writing into `out_dir`.
    pub fn new(config: &'a TexliftConfig, out_dir: PathBuf) -> Self {
        let jobs = if config.batch.jobs == 0 { default_jobs() } else { config.batch.jobs };
        Self { config, out_dir, jobs, force: false, verbose: false }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set force mode (reprocess all textures regardless of manifest).
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Run the batch over an ordered collection of source textures.
    ///
    /// Per-texture errors are caught at the texture boundary and recorded;
    /// only output-directory and manifest I/O can fail the call itself.
    pub fn run(&self, inputs: &[PathBuf]) -> Result<BatchResult, BatchError> {
        let start = Instant::now();

        std::fs::create_dir_all(&self.out_dir)?;

        let mut manifest =
            BatchManifest::load_from_dir(&self.out_dir).ok().flatten().unwrap_or_default();

        let upscaler = create_upscaler(self.config.upscale.backend);
        let devices = DevicePool::new(&self.config.upscale.devices);

        if self.verbose {
            println!(
                "Batch: {} textures, {} workers, backend {}",
                inputs.len(),
                self.jobs,
                upscaler.name()
            );
        }

        let next_index = AtomicUsize::new(0);
        let collected: Mutex<Vec<(usize, TextureResult)>> = Mutex::new(Vec::new());

        std::thread::scope(|s| {
            let num_workers = self.jobs.min(inputs.len().max(1));
            for _ in 0..num_workers {
                let next_index = &next_index;
                let collected = &collected;
                let manifest = &manifest;
                let upscaler = upscaler.as_ref();
                let devices = &devices;

                s.spawn(move || loop {
                    let index = next_index.fetch_add(1, Ordering::SeqCst);
                    if index >= inputs.len() {
                        break;
                    }

                    let source = &inputs[index];
                    let result = self.process_one(source, manifest, upscaler, devices);
                    collected.lock().unwrap().push((index, result));
                });
            }
        });

        let mut indexed = collected.into_inner().unwrap();
        indexed.sort_by_key(|(index, _)| *index);

        let mut result = BatchResult::new();
        for (_, texture_result) in indexed {
            let produced = texture_result.is_success()
                && !matches!(texture_result.status, TextureStatus::Skipped);
            if produced {
                if let Some(output) = texture_result.output.as_deref() {
                    manifest.record(
                        &texture_result.source,
                        output,
                        Some(texture_result.duration.as_millis() as u64),
                    )?;
                }
            }
            result.add_result(texture_result);
        }

        manifest.save_to_dir(&self.out_dir)?;
        result.total_duration = start.elapsed();

        Ok(result)
    }

    /// Process a single texture, mapping every failure into its result.
    fn process_one(
        &self,
        source: &Path,
        manifest: &BatchManifest,
        upscaler: &dyn crate::upscaler::ColorUpscaler,
        devices: &DevicePool,
    ) -> TextureResult {
        let start = Instant::now();
        let output_path = self.output_path(source);

        if !self.force {
            if let Ok(false) = manifest.needs_upscale(source) {
                if self.verbose {
                    println!("Skipping {} (up to date)", source.display());
                }
                return TextureResult::skipped(source.to_path_buf(), output_path);
            }
        }

        if self.verbose {
            println!("Processing {} ...", source.display());
        }

        let texture = match output::load_texture(source) {
            Ok(t) => t,
            Err(e) => {
                return TextureResult::failed(source.to_path_buf(), e.to_string(), start.elapsed())
            }
        };

        let processed = match pipeline::process_texture(&texture, self.config, upscaler, devices) {
            Ok(p) => p,
            Err(e) => {
                return TextureResult::failed(source.to_path_buf(), e.to_string(), start.elapsed())
            }
        };

        if let Err(e) = output::save_png(&processed.image, &output_path) {
            return TextureResult::failed(source.to_path_buf(), e.to_string(), start.elapsed());
        }

        let duration = start.elapsed();
        if processed.residual_flags > self.config.halo.max_flags {
            let warning = crate::error::PipelineError::HaloResidual {
                flags: processed.residual_flags,
            }
            .to_string();
            return TextureResult::needs_review(
                source.to_path_buf(),
                output_path,
                duration,
                warning,
            );
        }

        TextureResult::done(source.to_path_buf(), output_path, duration)
    }

    /// Output path for a source texture: same file name, in the output
    /// directory.
    fn output_path(&self, source: &Path) -> PathBuf {
        let name = source.file_name().unwrap_or_else(|| source.as_os_str());
        self.out_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn keyed_texture() -> RgbaImage {
        let mut texture = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 255, 255]));
        texture.put_pixel(1, 1, Rgba([200, 210, 220, 255]));
        texture.put_pixel(2, 2, Rgba([40, 50, 60, 255]));
        texture
    }

    fn write_texture(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        keyed_texture().save(&path).unwrap();
        path
    }

    fn test_config() -> TexliftConfig {
        let mut config = TexliftConfig::default();
        config.upscale.scale = 2;
        config
    }

    #[test]
    fn test_runner_jobs_default_and_override() {
        let config = test_config();
        let runner = BatchRunner::new(&config, PathBuf::from("out"));
        assert!(runner.jobs() >= 1);

        let runner = runner.with_jobs(0);
        assert_eq!(runner.jobs(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let temp = TempDir::new().unwrap();
        let config = test_config();
        let runner = BatchRunner::new(&config, temp.path().join("out"));

        let result = runner.run(&[]).unwrap();
        assert!(result.is_success());
        assert!(result.textures.is_empty());
    }

    #[test]
    fn test_batch_produces_outputs_in_order() {
        let temp = TempDir::new().unwrap();
        let inputs = vec![
            write_texture(temp.path(), "a.png"),
            write_texture(temp.path(), "b.png"),
            write_texture(temp.path(), "c.png"),
        ];

        let config = test_config();
        let out_dir = temp.path().join("out");
        let runner = BatchRunner::new(&config, out_dir.clone()).with_jobs(2);

        let result = runner.run(&inputs).unwrap();
        assert_eq!(result.done_count(), 3);
        assert_eq!(result.textures[0].source, inputs[0]);
        assert_eq!(result.textures[2].source, inputs[2]);
        assert!(out_dir.join("a.png").exists());
        assert!(out_dir.join("c.png").exists());
    }

    #[test]
    fn test_rerun_skips_up_to_date_textures() {
        let temp = TempDir::new().unwrap();
        let inputs = vec![write_texture(temp.path(), "a.png"), write_texture(temp.path(), "b.png")];

        let config = test_config();
        let runner = BatchRunner::new(&config, temp.path().join("out"));

        let first = runner.run(&inputs).unwrap();
        assert_eq!(first.done_count(), 2);

        let second = runner.run(&inputs).unwrap();
        assert_eq!(second.done_count(), 0);
        assert_eq!(second.skipped_count(), 2);
    }

    #[test]
    fn test_force_reprocesses_everything() {
        let temp = TempDir::new().unwrap();
        let inputs = vec![write_texture(temp.path(), "a.png")];

        let config = test_config();
        let runner = BatchRunner::new(&config, temp.path().join("out"));
        runner.run(&inputs).unwrap();

        let forced = BatchRunner::new(&config, temp.path().join("out")).with_force(true);
        let result = forced.run(&inputs).unwrap();
        assert_eq!(result.done_count(), 1);
        assert_eq!(result.skipped_count(), 0);
    }

    #[test]
    fn test_corrupt_texture_does_not_abort_batch() {
        let temp = TempDir::new().unwrap();
        let good_a = write_texture(temp.path(), "a.png");
        let bad = temp.path().join("broken.png");
        std::fs::write(&bad, b"not a png at all").unwrap();
        let good_b = write_texture(temp.path(), "b.png");

        let config = test_config();
        let out_dir = temp.path().join("out");
        let runner = BatchRunner::new(&config, out_dir.clone());

        let result = runner.run(&[good_a, bad.clone(), good_b]).unwrap();
        assert_eq!(result.done_count(), 2);
        assert_eq!(result.failed_count(), 1);

        let failure = &result.failures()[0];
        assert_eq!(failure.source, bad);
        assert!(matches!(&failure.status, TextureStatus::Failed(msg) if msg.contains("corrupt input")));

        assert!(out_dir.join("a.png").exists());
        assert!(out_dir.join("b.png").exists());
        assert!(!out_dir.join("broken.png").exists());
    }
}
