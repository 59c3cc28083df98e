//! Batch result types.
//!
//! Contains types for representing the outcome of a batch run.

use std::path::PathBuf;
use std::time::Duration;

/// Status of a single texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureStatus {
    /// Pipeline completed cleanly
    Done,
    /// Skipped (output already up to date)
    Skipped,
    /// Output emitted but residual contamination needs manual review
    NeedsReview,
    /// Pipeline failed with error
    Failed(String),
}

impl TextureStatus {
    /// Check if the status produced (or kept) a usable output.
    pub fn is_success(&self) -> bool {
        !self.is_failure()
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, TextureStatus::Failed(_))
    }
}

impl std::fmt::Display for TextureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureStatus::Done => write!(f, "done"),
            TextureStatus::Skipped => write!(f, "skipped"),
            TextureStatus::NeedsReview => write!(f, "needs review"),
            TextureStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of processing a single texture.
#[derive(Debug, Clone)]
pub struct TextureResult {
    /// Source texture path
    pub source: PathBuf,
    /// Outcome
    pub status: TextureStatus,
    /// Output file, when one was produced
    pub output: Option<PathBuf>,
    /// Processing duration
    pub duration: Duration,
    /// Warning messages (if any)
    pub warnings: Vec<String>,
}

impl TextureResult {
    /// Create a completed result.
    pub fn done(source: PathBuf, output: PathBuf, duration: Duration) -> Self {
        Self { source, status: TextureStatus::Done, output: Some(output), duration, warnings: vec![] }
    }

    /// Create a skipped result.
    pub fn skipped(source: PathBuf, output: PathBuf) -> Self {
        Self {
            source,
            status: TextureStatus::Skipped,
            output: Some(output),
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    /// Create a needs-review result.
    pub fn needs_review(
        source: PathBuf,
        output: PathBuf,
        duration: Duration,
        warning: String,
    ) -> Self {
        Self {
            source,
            status: TextureStatus::NeedsReview,
            output: Some(output),
            duration,
            warnings: vec![warning],
        }
    }

    /// Create a failed result.
    pub fn failed(source: PathBuf, error: String, duration: Duration) -> Self {
        Self { source, status: TextureStatus::Failed(error), output: None, duration, warnings: vec![] }
    }

    /// Check if this result produced a usable output.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Result of a complete batch run.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Results for each texture, in input order
    pub textures: Vec<TextureResult>,
    /// Total batch duration
    pub total_duration: Duration,
}

impl BatchResult {
    /// Create a new empty batch result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a texture result.
    pub fn add_result(&mut self, result: TextureResult) {
        self.textures.push(result);
    }

    /// Get the number of cleanly completed textures.
    pub fn done_count(&self) -> usize {
        self.textures.iter().filter(|r| matches!(r.status, TextureStatus::Done)).count()
    }

    /// Get the number of skipped textures.
    pub fn skipped_count(&self) -> usize {
        self.textures.iter().filter(|r| matches!(r.status, TextureStatus::Skipped)).count()
    }

    /// Get the number of textures marked for manual review.
    pub fn review_count(&self) -> usize {
        self.textures.iter().filter(|r| matches!(r.status, TextureStatus::NeedsReview)).count()
    }

    /// Get the number of failed textures.
    pub fn failed_count(&self) -> usize {
        self.textures.iter().filter(|r| r.status.is_failure()).count()
    }

    /// Check if the overall batch succeeded (no failures).
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get failed texture results.
    pub fn failures(&self) -> Vec<&TextureResult> {
        self.textures.iter().filter(|r| r.status.is_failure()).collect()
    }

    /// Get all warnings.
    pub fn all_warnings(&self) -> Vec<&String> {
        self.textures.iter().flat_map(|r| r.warnings.iter()).collect()
    }

    /// Format a summary of the batch result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let done = self.done_count();
        let skipped = self.skipped_count();
        let review = self.review_count();
        let failed = self.failed_count();
        let total = self.textures.len();

        if failed > 0 {
            lines.push(format!(
                "Batch finished with failures: {} done, {} skipped, {} need review, {} failed ({} total)",
                done, skipped, review, failed, total
            ));
            for texture in self.failures() {
                lines.push(format!("  - {}: {}", texture.source.display(), texture.status));
            }
        } else {
            lines.push(format!(
                "Batch succeeded: {} done, {} skipped, {} need review ({} total) in {:?}",
                done, skipped, review, total, self.total_duration
            ));
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}
