//! Batch manifest for idempotent re-runs.
//!
//! The manifest records, for each successfully produced texture, the source
//! content hash plus the output path, checksum, and size. A re-run skips
//! textures whose source hash still matches and whose output still exists,
//! so aborted batches resume where they left off and completed batches are
//! no-ops.
//!
//! Stored as JSON in `.texlift-manifest.json` in the output directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use std::time::SystemTime;

/// Current manifest format version.
const MANIFEST_VERSION: u32 = 1;

/// Default manifest filename.
pub const MANIFEST_FILENAME: &str = ".texlift-manifest.json";

/// Error during manifest operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ManifestError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Manifest entry for one produced texture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureManifest {
    /// Content hash of the source texture
    pub source_hash: String,
    /// Output file path
    pub output: String,
    /// Content hash of the output
    pub output_checksum: String,
    /// Output size in bytes
    pub output_size: u64,
    /// When the texture was produced
    pub built_at: String,
    /// Processing duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Batch manifest tracking all produced textures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    /// Manifest format version
    pub version: u32,
    /// When the manifest was last updated
    pub updated_at: String,
    /// Entry per source texture, keyed by source path
    pub entries: HashMap<String, TextureManifest>,
}

impl Default for BatchManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchManifest {
    /// Create a new empty manifest.
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            updated_at: format_timestamp(SystemTime::now()),
            entries: HashMap::new(),
        }
    }

    /// Load a manifest from a file.
    ///
    /// Returns `Ok(None)` when the file does not exist or carries an
    /// incompatible version; an old manifest is discarded, not fatal.
    pub fn load(path: &Path) -> Result<Option<Self>, ManifestError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let manifest: BatchManifest = serde_json::from_reader(reader)?;

        if manifest.version != MANIFEST_VERSION {
            return Ok(None);
        }

        Ok(Some(manifest))
    }

    /// Load a manifest from the default location in the output directory.
    pub fn load_from_dir(out_dir: &Path) -> Result<Option<Self>, ManifestError> {
        Self::load(&out_dir.join(MANIFEST_FILENAME))
    }

    /// Save the manifest to a file.
    pub fn save(&mut self, path: &Path) -> Result<(), ManifestError> {
        self.updated_at = format_timestamp(SystemTime::now());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }

    /// Save the manifest to the default location in the output directory.
    pub fn save_to_dir(&mut self, out_dir: &Path) -> Result<(), ManifestError> {
        self.save(&out_dir.join(MANIFEST_FILENAME))
    }

    /// Record a successfully produced texture.
    pub fn record(
        &mut self,
        source: &Path,
        output: &Path,
        duration_ms: Option<u64>,
    ) -> Result<(), ManifestError> {
        let source_hash = hash_file(source)?;
        let output_checksum = hash_file(output)?;
        let output_size = fs::metadata(output)?.len();

        self.entries.insert(
            source.to_string_lossy().to_string(),
            TextureManifest {
                source_hash,
                output: output.to_string_lossy().to_string(),
                output_checksum,
                output_size,
                built_at: format_timestamp(SystemTime::now()),
                duration_ms,
            },
        );
        Ok(())
    }

    /// Check if a texture needs to be processed.
    ///
    /// A texture needs processing if it was never produced, its recorded
    /// output is missing, or the source content changed.
    pub fn needs_upscale(&self, source: &Path) -> Result<bool, ManifestError> {
        let entry = match self.entries.get(&source.to_string_lossy().to_string()) {
            Some(e) => e,
            None => return Ok(true),
        };

        if !Path::new(&entry.output).exists() {
            return Ok(true);
        }

        if !source.exists() {
            return Ok(true);
        }
        let current_hash = hash_file(source)?;
        Ok(current_hash != entry.source_hash)
    }

    /// Get the manifest entry for a source texture.
    pub fn get(&self, source: &Path) -> Option<&TextureManifest> {
        self.entries.get(&source.to_string_lossy().to_string())
    }

    /// Get the number of entries in the manifest.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Hash a file's contents.
fn hash_file(path: &Path) -> Result<String, ManifestError> {
    let mut file = File::open(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;

    Ok(format!("{:016x}", fnv1a_hash(&contents)))
}

/// FNV-1a hash algorithm.
fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Format a SystemTime as an ISO-8601 UTC timestamp.
fn format_timestamp(time: SystemTime) -> String {
    let duration = time.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
    let secs = duration.as_secs();

    let days = secs / 86400;
    let remaining = secs % 86400;
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;

    let (year, month, day) = days_to_ymd(days as i64);

    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z", year, month, day, hours, minutes, seconds)
}

/// Convert days since Unix epoch to year/month/day (civil calendar).
fn days_to_ymd(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = z.div_euclid(146097);
    let doe = z.rem_euclid(146097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if month <= 2 { year + 1 } else { year }, month, day)
}
