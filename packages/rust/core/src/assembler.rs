//! Output layout and run report.
//!
//! Every artifact of a run is named after the run's local calendar date:
//!
//! ```text
//! <output_root>/
//! ├── <YYYY-MM-DD> - Summaries/
//! │   └── <relative_dir>/<stem>_summary.txt
//! ├── <YYYY-MM-DD>_summaries.docx
//! ├── <YYYY-MM-DD>_summaries.epub
//! └── <YYYY-MM-DD>_report.json
//! ```

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use summarybook_shared::{ArtifactMeta, Result, RunReport, SummaryBookError};

/// Paths of every artifact produced by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Root of the mirrored per-article summary tree.
    pub summaries_dir: PathBuf,
    /// Aggregated DOCX document.
    pub document: PathBuf,
    /// Final EPUB.
    pub ebook: PathBuf,
    /// JSON run report.
    pub report: PathBuf,
}

impl OutputLayout {
    /// Layout for a run on `date`.
    pub fn for_date(output_root: &Path, date: NaiveDate) -> Self {
        let stamp = date.format("%Y-%m-%d");
        Self {
            summaries_dir: output_root.join(format!("{stamp} - Summaries")),
            document: output_root.join(format!("{stamp}_summaries.docx")),
            ebook: output_root.join(format!("{stamp}_summaries.epub")),
            report: output_root.join(format!("{stamp}_report.json")),
        }
    }

    /// Layout for a run today (local time).
    pub fn today(output_root: &Path) -> Self {
        Self::for_date(output_root, Local::now().date_naive())
    }
}

/// Size and SHA-256 of a written artifact.
pub fn artifact_meta(path: &Path) -> Result<ArtifactMeta> {
    let bytes = std::fs::read(path).map_err(|e| SummaryBookError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = format!("{:x}", hasher.finalize());

    debug!(path = %path.display(), size = bytes.len(), "artifact hashed");

    Ok(ArtifactMeta {
        path: path.to_path_buf(),
        sha256: hash,
        size_bytes: bytes.len(),
    })
}

/// Write the run report (temp file, then rename).
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| {
        SummaryBookError::validation(format!("JSON serialization failed: {e}"))
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SummaryBookError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "report.json".into());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| SummaryBookError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| SummaryBookError::io(path, e))?;

    info!(
        summaries = report.summaries_written,
        skipped = report.skipped.len(),
        chapters = report.chapter_count,
        "run report written"
    );
    Ok(())
}

/// Read a previously written run report.
pub fn read_report(path: &Path) -> Result<RunReport> {
    let content = std::fs::read_to_string(path).map_err(|e| SummaryBookError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| SummaryBookError::validation(format!("invalid run report: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
