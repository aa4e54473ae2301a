//! Core domain types shared by the SummaryBook stages.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Count whitespace-delimited words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Summarizer input / output
// ---------------------------------------------------------------------------

/// A plain-text article discovered under the input tree.
#[derive(Debug, Clone)]
pub struct SourceArticle {
    /// Absolute or input-rooted path of the article file.
    pub path: PathBuf,
    /// Directory of the article relative to the input root (`.` for the root).
    pub relative_dir: PathBuf,
    /// Raw article text.
    pub text: String,
    /// Whitespace-delimited word count of `text`.
    pub word_count: usize,
}

/// A cleaned summary persisted for one article.
#[derive(Debug, Clone)]
pub struct SummaryArtifact {
    /// Where the summary text was written.
    pub path: PathBuf,
    /// The article this summary was generated from.
    pub source_path: PathBuf,
    /// Cleaned summary text.
    pub text: String,
    /// Model that produced the summary.
    pub model: String,
    /// Whether the summary is shorter than the requested length.
    pub under_length: bool,
}

// ---------------------------------------------------------------------------
// Per-item outcomes
// ---------------------------------------------------------------------------

/// Why a stage did not produce output for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The input file could not be read.
    Unreadable { error: String },
    /// The article has fewer words than the configured minimum.
    TooShort { words: usize, minimum: usize },
    /// The summarization service call failed.
    ServiceFailed { error: String },
    /// The service answered with nothing usable after cleaning.
    EmptyResponse,
    /// The summary could not be written to disk.
    WriteFailed { error: String },
    /// Nothing was left after boilerplate filtering.
    NoContent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable { error } => write!(f, "unreadable: {error}"),
            Self::TooShort { words, minimum } => {
                write!(f, "too short: {words} words (minimum {minimum})")
            }
            Self::ServiceFailed { error } => write!(f, "service call failed: {error}"),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::WriteFailed { error } => write!(f, "write failed: {error}"),
            Self::NoContent => write!(f, "no content after filtering"),
        }
    }
}

/// Result of processing one item in a stage.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The item produced output.
    Accepted(T),
    /// The item was skipped; the run continues.
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    /// Returns the accepted value, if any.
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    /// Returns the skip reason, if any.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Skipped(reason) => Some(reason),
        }
    }
}

/// A skipped item together with its reason, for run statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// File the skip applies to.
    pub path: PathBuf,
    /// Why it was skipped.
    pub reason: SkipReason,
}

// ---------------------------------------------------------------------------
// Aggregated document
// ---------------------------------------------------------------------------

/// One heading + body block derived from a single summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlock {
    /// Heading text (never empty).
    pub title: String,
    /// Body paragraphs in original order.
    pub paragraphs: Vec<String>,
}

/// The ordered blocks that make up the aggregated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedDocument {
    pub blocks: Vec<DocumentBlock>,
}

// ---------------------------------------------------------------------------
// E-book
// ---------------------------------------------------------------------------

/// A titled e-book chapter with rendered XHTML body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// 1-based chapter number.
    pub number: usize,
    /// Chapter title (the heading text).
    pub title: String,
    /// File name inside the package, e.g. `chap_1.xhtml`.
    pub file_name: String,
    /// `<h1>` title followed by one `<p>` per paragraph.
    pub content: String,
}

/// One table-of-contents link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Display title.
    pub title: String,
    /// Target document inside the package.
    pub href: String,
    /// Stable navigation id (`chap_N`).
    pub id: String,
}

/// Chapters plus a table of contents mirroring them 1:1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EBook {
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocEntry>,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Checksum entry for a written artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `<date>_report.json` written at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Tool version that produced the run.
    pub tool_version: String,
    /// When the run finished.
    pub finished_at: DateTime<Local>,
    /// Articles discovered under the input tree.
    pub articles_discovered: usize,
    /// Summary artifacts written.
    pub summaries_written: usize,
    /// Summaries shorter than the requested length.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub under_length: Vec<PathBuf>,
    /// Items skipped by any stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkipRecord>,
    /// The aggregated document, when written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<ArtifactMeta>,
    /// The e-book, when written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebook: Option<ArtifactMeta>,
    /// Chapters in the e-book.
    pub chapter_count: usize,
    /// Summary files fed to the aggregation stage.
    #[serde(default)]
    pub summaries_aggregated: usize,
    /// Error that stopped the run before the e-book was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn outcome_accessors() {
        let ok: Outcome<u32> = Outcome::Accepted(7);
        assert!(ok.skip_reason().is_none());
        assert_eq!(ok.accepted(), Some(7));

        let skipped: Outcome<u32> = Outcome::Skipped(SkipReason::EmptyResponse);
        assert_eq!(skipped.skip_reason(), Some(&SkipReason::EmptyResponse));
        assert_eq!(skipped.accepted(), None);
    }

    #[test]
    fn skip_reason_serializes_tagged() {
        let reason = SkipReason::TooShort {
            words: 10,
            minimum: 50,
        };
        let json = serde_json::to_string(&reason).expect("serialize");
        assert_eq!(json, r#"{"kind":"too_short","words":10,"minimum":50}"#);
        assert_eq!(reason.to_string(), "too short: 10 words (minimum 50)");
    }

    #[test]
    fn report_omits_empty_sections() {
        let report = RunReport {
            tool_version: "0.1.0".into(),
            finished_at: Local::now(),
            articles_discovered: 0,
            summaries_written: 0,
            under_length: vec![],
            skipped: vec![],
            document: None,
            ebook: None,
            chapter_count: 0,
            summaries_aggregated: 0,
            aborted: None,
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert!(!json.contains("skipped"));
        assert!(!json.contains("ebook"));
        let parsed: RunReport = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.chapter_count, 0);
    }
}
