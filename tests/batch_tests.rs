//! Batch-level tests: error isolation and idempotent re-runs.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use texlift::batch::{BatchRunner, TextureStatus};
use texlift::config::TexliftConfig;
use texlift::output::load_texture;

fn write_keyed_texture(dir: &Path, name: &str, size: u32) -> PathBuf {
    let mut texture = RgbaImage::from_pixel(size, size, Rgba([255, 0, 255, 255]));
    for y in size / 4..size - size / 4 {
        for x in size / 4..size - size / 4 {
            texture.put_pixel(x, y, Rgba([180, 190, 200, 255]));
        }
    }
    let path = dir.join(name);
    texture.save(&path).unwrap();
    path
}

#[test]
fn corrupt_texture_is_reported_and_batch_continues() {
    let temp = TempDir::new().unwrap();
    let src_dir = temp.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();

    let inputs = vec![
        write_keyed_texture(&src_dir, "floor.png", 8),
        {
            let bad = src_dir.join("garbled.png");
            fs::write(&bad, b"\x89PNG but actually garbage").unwrap();
            bad
        },
        write_keyed_texture(&src_dir, "wall.png", 8),
    ];

    let config = TexliftConfig::default();
    let out_dir = temp.path().join("out");
    let result = BatchRunner::new(&config, out_dir.clone()).run(&inputs).unwrap();

    assert_eq!(result.textures.len(), 3);
    assert_eq!(result.done_count(), 2);
    assert_eq!(result.failed_count(), 1);
    assert!(!result.is_success());

    // The failure is attributed to the corrupt texture alone.
    let failure = &result.failures()[0];
    assert!(failure.source.ends_with("garbled.png"));
    assert!(matches!(&failure.status, TextureStatus::Failed(msg) if msg.contains("corrupt input")));

    // The other textures produced valid scaled outputs.
    for name in ["floor.png", "wall.png"] {
        let produced = load_texture(&out_dir.join(name)).unwrap();
        assert_eq!(produced.dimensions(), (32, 32));
    }
    assert!(!out_dir.join("garbled.png").exists());

    // The summary accounts for every texture.
    let summary = result.summary();
    assert!(summary.contains("2 done"));
    assert!(summary.contains("1 failed"));
    assert!(summary.contains("garbled.png"));
}

#[test]
fn rerun_is_idempotent_and_skips_produced_outputs() {
    let temp = TempDir::new().unwrap();
    let src_dir = temp.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();

    let inputs = vec![
        write_keyed_texture(&src_dir, "a.png", 8),
        write_keyed_texture(&src_dir, "b.png", 8),
    ];

    let config = TexliftConfig::default();
    let out_dir = temp.path().join("out");

    let first = BatchRunner::new(&config, out_dir.clone()).run(&inputs).unwrap();
    assert_eq!(first.done_count(), 2);

    let first_bytes = fs::read(out_dir.join("a.png")).unwrap();

    let second = BatchRunner::new(&config, out_dir.clone()).run(&inputs).unwrap();
    assert_eq!(second.done_count(), 0);
    assert_eq!(second.skipped_count(), 2);

    // Skipping leaves the existing output untouched.
    assert_eq!(fs::read(out_dir.join("a.png")).unwrap(), first_bytes);
}

#[test]
fn changed_source_is_reprocessed() {
    let temp = TempDir::new().unwrap();
    let src_dir = temp.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();

    let input = write_keyed_texture(&src_dir, "a.png", 8);
    let config = TexliftConfig::default();
    let out_dir = temp.path().join("out");

    BatchRunner::new(&config, out_dir.clone()).run(std::slice::from_ref(&input)).unwrap();

    // Rewrite the source with different content.
    let texture = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
    texture.save(&input).unwrap();

    let rerun = BatchRunner::new(&config, out_dir).run(std::slice::from_ref(&input)).unwrap();
    assert_eq!(rerun.done_count(), 1);
    assert_eq!(rerun.skipped_count(), 0);
}

#[test]
fn deleted_output_is_regenerated() {
    let temp = TempDir::new().unwrap();
    let src_dir = temp.path().join("src");
    fs::create_dir_all(&src_dir).unwrap();

    let input = write_keyed_texture(&src_dir, "a.png", 8);
    let config = TexliftConfig::default();
    let out_dir = temp.path().join("out");

    BatchRunner::new(&config, out_dir.clone()).run(std::slice::from_ref(&input)).unwrap();
    fs::remove_file(out_dir.join("a.png")).unwrap();

    let rerun = BatchRunner::new(&config, out_dir.clone()).run(std::slice::from_ref(&input)).unwrap();
    assert_eq!(rerun.done_count(), 1);
    assert!(out_dir.join("a.png").exists());
}
