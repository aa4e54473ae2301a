//! Aggregation stage: summary files → one structured DOCX document.
//!
//! Each summary is loosely structured text. Its title is inferred by a small
//! prioritized rule set (see [`TitleRule`]); everything else becomes body
//! paragraphs. Blocks are emitted in input order.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use summarybook_docx::DocxWriter;
use summarybook_shared::{
    AggregatedDocument, DocumentBlock, Result, SkipReason, SkipRecord, SummaryBookError,
};

/// Which title rule produced a block's heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// A line starts with the title marker; the marker is stripped.
    MarkerPrefix,
    /// A line contains the title marker somewhere; the line is kept whole.
    MarkerContained,
    /// No marker anywhere; the first non-blank line is the title.
    FirstLine,
}

/// A block together with the rule that chose its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockExtraction {
    pub block: DocumentBlock,
    pub rule: TitleRule,
}

/// Phrases and markers used by title detection.
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    boilerplate: Vec<String>,
    marker: String,
    marker_prefix: Regex,
}

impl HeuristicConfig {
    pub fn new(boilerplate_phrases: &[String], title_marker: &str) -> Result<Self> {
        let marker = title_marker.trim().to_lowercase();
        if marker.is_empty() {
            return Err(SummaryBookError::config("title marker must not be empty"));
        }

        let marker_prefix = Regex::new(&format!(r"(?i)^{}\s*:?\s*", regex::escape(&marker)))
            .map_err(|e| SummaryBookError::config(format!("invalid title marker: {e}")))?;

        Ok(Self {
            boilerplate: boilerplate_phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            marker,
            marker_prefix,
        })
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.boilerplate.iter().any(|p| lower.contains(p.as_str()))
    }

    fn starts_with_marker(&self, trimmed: &str) -> bool {
        trimmed.to_lowercase().starts_with(&self.marker)
    }

    fn contains_marker(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.marker)
    }

    /// Heading text of a marker-prefixed line: marker and optional colon removed.
    fn strip_marker<'a>(&self, trimmed: &'a str) -> &'a str {
        match self.marker_prefix.find(trimmed) {
            Some(m) => &trimmed[m.end()..],
            None => trimmed,
        }
    }
}

/// Output of [`aggregate`].
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    /// Blocks in input order.
    pub document: AggregatedDocument,
    /// Inputs that contributed no block.
    pub skipped: Vec<SkipRecord>,
}

/// Apply the title rules to one summary text.
///
/// Boilerplate lines are dropped first, then leading blank lines. The first
/// matching rule wins:
/// 1. a line whose trimmed text starts with the marker ([`TitleRule::MarkerPrefix`]),
/// 2. a line containing the marker anywhere ([`TitleRule::MarkerContained`]),
/// 3. the first non-blank line ([`TitleRule::FirstLine`]).
///
/// Returns `None` when nothing non-blank survives filtering.
pub fn extract_block(text: &str, config: &HeuristicConfig) -> Option<BlockExtraction> {
    let mut lines: Vec<&str> = split_lines(text)
        .into_iter()
        .filter(|line| !config.is_boilerplate(line))
        .collect();
    let leading_blank = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..leading_blank);

    if let Some(index) = lines
        .iter()
        .position(|l| config.starts_with_marker(l.trim()))
    {
        let line = lines[index].trim();
        let stripped = config.strip_marker(line).trim();
        let title = if stripped.is_empty() { line } else { stripped };
        return Some(split_block(&lines, index, title, TitleRule::MarkerPrefix));
    }

    if let Some(index) = lines.iter().position(|l| config.contains_marker(l)) {
        let title = lines[index].trim();
        return Some(split_block(&lines, index, title, TitleRule::MarkerContained));
    }

    let index = lines.iter().position(|l| !l.trim().is_empty())?;
    let title = lines[index].trim();
    Some(split_block(&lines, index, title, TitleRule::FirstLine))
}

/// Every non-blank line except the title line becomes a trimmed paragraph.
fn split_block(lines: &[&str], title_index: usize, title: &str, rule: TitleRule) -> BlockExtraction {
    let paragraphs = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != title_index)
        .map(|(_, l)| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    BlockExtraction {
        block: DocumentBlock {
            title: title.to_string(),
            paragraphs,
        },
        rule,
    }
}

/// Split on every Unicode line boundary (`\n`, `\r`, `\r\n`, `\x0b`, `\x0c`,
/// `\x1c`..`\x1e`, `\u{85}`, `\u{2028}`, `\u{2029}`).
///
/// A trailing terminator does not produce an empty final line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = match c {
            '\r' => match chars.peek() {
                Some((_, '\n')) => {
                    chars.next();
                    i + 2
                }
                _ => i + 1,
            },
            '\n' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}' => i + c.len_utf8(),
            _ => continue,
        };
        lines.push(&text[start..i]);
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Read every summary file in order and extract its block.
///
/// Unreadable files and files with no content are skipped with a warning.
#[instrument(skip_all, fields(inputs = paths.len()))]
pub fn aggregate(paths: &[PathBuf], config: &HeuristicConfig) -> AggregateResult {
    let mut result = AggregateResult::default();

    for path in paths {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read summary, skipping");
                result.skipped.push(SkipRecord {
                    path: path.clone(),
                    reason: SkipReason::Unreadable {
                        error: e.to_string(),
                    },
                });
                continue;
            }
        };

        match extract_block(&text, config) {
            Some(extraction) => {
                debug!(
                    path = %path.display(),
                    rule = ?extraction.rule,
                    title = %extraction.block.title,
                    paragraphs = extraction.block.paragraphs.len(),
                    "block extracted"
                );
                result.document.blocks.push(extraction.block);
            }
            None => {
                warn!(path = %path.display(), "summary has no content after filtering, skipping");
                result.skipped.push(SkipRecord {
                    path: path.clone(),
                    reason: SkipReason::NoContent,
                });
            }
        }
    }

    result
}

/// Render blocks as DOCX paragraphs: a `Heading1`, the body, then a blank separator.
pub fn render_document(document: &AggregatedDocument) -> DocxWriter {
    let mut writer = DocxWriter::new();
    for block in &document.blocks {
        writer.add_heading(block.title.as_str(), 1);
        for paragraph in &block.paragraphs {
            writer.add_paragraph(paragraph.as_str());
        }
        writer.add_paragraph("");
    }
    writer
}

/// Aggregate `paths` and write the document to `out_path`.
///
/// A write failure is returned as an error; per-file problems are skips.
#[instrument(skip_all, fields(inputs = paths.len(), out = %out_path.display()))]
pub fn create_document(
    paths: &[PathBuf],
    config: &HeuristicConfig,
    out_path: &Path,
) -> Result<AggregateResult> {
    let result = aggregate(paths, config);
    render_document(&result.document).save(out_path)?;

    info!(
        blocks = result.document.blocks.len(),
        skipped = result.skipped.len(),
        "aggregated document written"
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
