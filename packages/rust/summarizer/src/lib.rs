//! Per-article summarization stage.
//!
//! This crate provides:
//! - [`client`]: the Gemini HTTP client behind the [`SummaryService`] seam
//! - [`prompt`]: the fixed summarization prompt
//! - [`rotation`]: caller-owned model rotation
//! - [`Summarizer`]: filters, summarizes, cleans and persists one article at a time

pub mod client;
pub mod prompt;
pub mod rotation;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use summarybook_shared::{
    Outcome, Result, SkipReason, SourceArticle, SummaryArtifact, SummaryBookError, word_count,
};

pub use client::{GeminiClient, SummaryService};
pub use prompt::build_prompt;
pub use rotation::ModelRotator;

/// Characters stripped from every completion.
const MARKUP_CHARS: [char; 2] = ['*', '#'];

/// Words of each summary echoed to the debug log.
const PREVIEW_WORDS: usize = 100;

/// Settings for the summarization stage.
#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    /// Articles below this many words are skipped.
    pub min_words: usize,
    /// Requested summary length; shorter summaries are flagged.
    pub expected_summary_words: usize,
    /// Appended to the source file stem (`<stem><suffix>.txt`).
    pub summary_suffix: String,
    /// Root of the mirrored summary tree for this run.
    pub output_dir: PathBuf,
}

/// Runs one article at a time through the service and writes the result.
pub struct Summarizer<S> {
    service: S,
    rotator: ModelRotator,
    options: SummarizerOptions,
}

impl<S: SummaryService> Summarizer<S> {
    pub fn new(service: S, rotator: ModelRotator, options: SummarizerOptions) -> Self {
        Self {
            service,
            rotator,
            options,
        }
    }

    /// Summarize a single article.
    ///
    /// Too-short articles, service failures, empty completions and write
    /// failures all come back as [`Outcome::Skipped`]; the caller moves on.
    #[instrument(skip_all, fields(path = %article.path.display(), words = article.word_count))]
    pub async fn generate_summary(&mut self, article: &SourceArticle) -> Outcome<SummaryArtifact> {
        if article.word_count < self.options.min_words {
            info!(
                words = article.word_count,
                minimum = self.options.min_words,
                "article too short, skipping"
            );
            return Outcome::Skipped(SkipReason::TooShort {
                words: article.word_count,
                minimum: self.options.min_words,
            });
        }

        let model = self.rotator.current().to_string();
        let prompt = build_prompt(&article.text, self.options.expected_summary_words);

        let raw = match self.service.generate(&model, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%model, error = %e, "summarization failed");
                return Outcome::Skipped(SkipReason::ServiceFailed {
                    error: e.to_string(),
                });
            }
        };

        let text = clean_summary(&raw);
        if text.is_empty() {
            warn!(%model, "service returned an empty summary");
            return Outcome::Skipped(SkipReason::EmptyResponse);
        }

        let summary_words = word_count(&text);
        let under_length = summary_words < self.options.expected_summary_words;
        if under_length {
            warn!(
                summary_words,
                expected = self.options.expected_summary_words,
                "summary shorter than requested"
            );
        }
        debug!(
            original_words = article.word_count,
            summary_words,
            preview = %preview(&text, PREVIEW_WORDS),
            "summary generated"
        );

        let path = summary_path(&self.options.output_dir, article, &self.options.summary_suffix);
        if let Err(e) = persist(&path, &text) {
            warn!(error = %e, "failed to write summary");
            return Outcome::Skipped(SkipReason::WriteFailed {
                error: e.to_string(),
            });
        }

        self.rotator.record_accepted();
        info!(path = %path.display(), %model, summary_words, "summary written");

        Outcome::Accepted(SummaryArtifact {
            path,
            source_path: article.path.clone(),
            text,
            model,
            under_length,
        })
    }
}

/// Strip `*` and `#` markup and surrounding whitespace from a completion.
pub fn clean_summary(raw: &str) -> String {
    raw.replace(MARKUP_CHARS, "").trim().to_string()
}

/// Where the summary for `article` goes: `<output_dir>/<relative_dir>/<stem><suffix>.txt`.
pub fn summary_path(output_dir: &Path, article: &SourceArticle, suffix: &str) -> PathBuf {
    let stem = article
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "article".to_string());

    let dir = if article.relative_dir == Path::new(".") {
        output_dir.to_path_buf()
    } else {
        output_dir.join(&article.relative_dir)
    };

    dir.join(format!("{stem}{suffix}.txt"))
}

fn persist(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SummaryBookError::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| SummaryBookError::io(path, e))
}

fn preview(text: &str, words: usize) -> String {
    text.split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
