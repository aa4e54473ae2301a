//! End-to-end pipeline: articles → summaries → DOCX → EPUB → report.
//!
//! Articles are processed strictly one at a time with a fixed pause after each
//! service call. Per-article problems become skip records; a failure to write
//! the document or the e-book aborts the remaining stages.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{error, info, instrument, warn};

use summarybook_epub::EpubMetadata;
use summarybook_shared::{
    EBook, LANGUAGE_TAG, Outcome, Result, RunConfig, RunReport, SkipReason, SkipRecord,
    SummaryArtifact,
};
use summarybook_summarizer::{ModelRotator, Summarizer, SummarizerOptions, SummaryService};

use crate::aggregator::{self, HeuristicConfig};
use crate::assembler::{self, OutputLayout};
use crate::packager;

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage ran and wrote its artifact.
    Completed,
    /// The stage did not run because an earlier stage aborted.
    NotRun,
    /// The stage failed; later stages were not run.
    Aborted(String),
}

impl StageStatus {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::NotRun => write!(f, "not run"),
            Self::Aborted(error) => write!(f, "aborted: {error}"),
        }
    }
}

/// Output of the summarization stage.
#[derive(Debug, Clone, Default)]
pub struct SummarizeOutput {
    /// Articles found under the input tree.
    pub discovered: usize,
    /// Written summaries, in discovery order.
    pub artifacts: Vec<SummaryArtifact>,
    /// Articles that produced no summary.
    pub skipped: Vec<SkipRecord>,
}

/// Result of a pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Where this run's artifacts live.
    pub layout: OutputLayout,
    /// The report written to `layout.report`.
    pub report: RunReport,
    /// Aggregation stage status.
    pub aggregate: StageStatus,
    /// Packaging stage status.
    pub package: StageStatus,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl RunResult {
    /// Whether a stage aborted the run.
    pub fn aborted(&self) -> bool {
        self.aggregate.is_aborted() || self.package.is_aborted()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each article has been handled.
    fn article_done(&self, path: &Path, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &RunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_done(&self, _path: &Path, _current: usize, _total: usize) {}
    fn done(&self, _result: &RunResult) {}
}

/// Run all three stages with today's output layout.
#[instrument(skip_all, fields(input = %config.input_dir.display(), output = %config.output_root.display()))]
pub async fn run<S: SummaryService>(
    config: &RunConfig,
    service: S,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let layout = OutputLayout::today(&config.output_root);
    run_with_layout(config, service, layout, progress).await
}

/// Run all three stages into an explicit layout.
pub async fn run_with_layout<S: SummaryService>(
    config: &RunConfig,
    service: S,
    layout: OutputLayout,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();
    info!(models = ?config.models, "starting run");

    let summaries = summarize_all(config, service, &layout.summaries_dir, progress).await?;
    let paths: Vec<PathBuf> = summaries.artifacts.iter().map(|a| a.path.clone()).collect();

    let mut report = new_report();
    report.articles_discovered = summaries.discovered;
    report.summaries_written = summaries.artifacts.len();
    report.under_length = summaries
        .artifacts
        .iter()
        .filter(|a| a.under_length)
        .map(|a| a.path.clone())
        .collect();
    report.skipped = summaries.skipped;

    finish(config, layout, &paths, report, start, progress)
}

/// Aggregate an existing summary tree, then package and report.
///
/// Summaries are taken in summary file-name order, which can differ from the
/// order of their source articles (`a0_summary.txt` sorts before `a_summary.txt`).
#[instrument(skip_all, fields(summaries = %summaries_dir.display()))]
pub fn aggregate_existing(
    config: &RunConfig,
    summaries_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();
    let layout = OutputLayout::today(&config.output_root);

    progress.phase("Discovering summaries");
    let paths: Vec<PathBuf> = summarybook_discovery::discover_articles(summaries_dir)?
        .into_iter()
        .map(|file| file.path)
        .collect();

    let report = new_report();
    finish(config, layout, &paths, report, start, progress)
}

/// Summarize every article under `config.input_dir` into `summaries_dir`.
///
/// Fails only when the input tree cannot be listed.
#[instrument(skip_all, fields(input = %config.input_dir.display()))]
pub async fn summarize_all<S: SummaryService>(
    config: &RunConfig,
    service: S,
    summaries_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<SummarizeOutput> {
    progress.phase("Discovering articles");
    let files = summarybook_discovery::discover_articles(&config.input_dir)?;

    let rotator = ModelRotator::new(config.models.clone(), config.summaries_per_model)?;
    let mut summarizer = Summarizer::new(
        service,
        rotator,
        SummarizerOptions {
            min_words: config.min_words,
            expected_summary_words: config.expected_summary_words,
            summary_suffix: config.summary_suffix.clone(),
            output_dir: summaries_dir.to_path_buf(),
        },
    );

    progress.phase("Summarizing articles");
    let total = files.len();
    let mut output = SummarizeOutput {
        discovered: total,
        ..Default::default()
    };

    for (i, file) in files.iter().enumerate() {
        let article = match summarybook_discovery::read_article(file) {
            Ok(article) => article,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "cannot read article, skipping");
                output.skipped.push(SkipRecord {
                    path: file.path.clone(),
                    reason: SkipReason::Unreadable {
                        error: e.to_string(),
                    },
                });
                progress.article_done(&file.path, i + 1, total);
                continue;
            }
        };

        let outcome = summarizer.generate_summary(&article).await;
        let called_service = !matches!(
            outcome.skip_reason(),
            Some(SkipReason::TooShort { .. })
        );

        match outcome {
            Outcome::Accepted(artifact) => output.artifacts.push(artifact),
            Outcome::Skipped(reason) => output.skipped.push(SkipRecord {
                path: article.path.clone(),
                reason,
            }),
        }
        progress.article_done(&article.path, i + 1, total);

        if called_service && i + 1 < total && !config.delay.is_zero() {
            tokio::time::sleep(config.delay).await;
        }
    }

    info!(
        discovered = output.discovered,
        written = output.artifacts.len(),
        skipped = output.skipped.len(),
        "summarization finished"
    );
    Ok(output)
}

/// Package an existing aggregated document.
#[instrument(skip_all, fields(document = %document.display()))]
pub fn package_document(config: &RunConfig, document: &Path, epub_path: &Path) -> Result<EBook> {
    packager::package(document, epub_path, epub_metadata(config))
}

/// E-book metadata from the run config.
pub fn epub_metadata(config: &RunConfig) -> EpubMetadata {
    EpubMetadata {
        title: config.book_title.clone(),
        identifier: config.book_identifier.clone(),
        language: LANGUAGE_TAG.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_report() -> RunReport {
    RunReport {
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        finished_at: Local::now(),
        articles_discovered: 0,
        summaries_written: 0,
        under_length: Vec::new(),
        skipped: Vec::new(),
        document: None,
        ebook: None,
        chapter_count: 0,
        summaries_aggregated: 0,
        aborted: None,
    }
}

/// Aggregate `paths`, package the document, and write the report.
fn finish(
    config: &RunConfig,
    layout: OutputLayout,
    paths: &[PathBuf],
    mut report: RunReport,
    start: Instant,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let heuristics = HeuristicConfig::new(&config.boilerplate_phrases, &config.title_marker)?;

    report.summaries_aggregated = paths.len();
    if paths.is_empty() {
        warn!("no summaries were produced, skipping document and e-book");
        return complete(layout, report, StageStatus::NotRun, StageStatus::NotRun, start, progress);
    }

    progress.phase("Aggregating summaries");
    let aggregate = match aggregator::create_document(paths, &heuristics, &layout.document) {
        Ok(result) => {
            report.skipped.extend(result.skipped);
            report.document = Some(assembler::artifact_meta(&layout.document)?);
            StageStatus::Completed
        }
        Err(e) => {
            error!(error = %e, "aggregation failed, skipping packaging");
            StageStatus::Aborted(e.to_string())
        }
    };

    let package = if aggregate == StageStatus::Completed {
        progress.phase("Packaging e-book");
        match package_document(config, &layout.document, &layout.ebook) {
            Ok(ebook) => {
                report.chapter_count = ebook.chapters.len();
                report.ebook = Some(assembler::artifact_meta(&layout.ebook)?);
                StageStatus::Completed
            }
            Err(e) => {
                error!(error = %e, "packaging failed");
                StageStatus::Aborted(e.to_string())
            }
        }
    } else {
        StageStatus::NotRun
    };

    complete(layout, report, aggregate, package, start, progress)
}

/// Record stage outcomes, write the report, and notify the reporter.
fn complete(
    layout: OutputLayout,
    mut report: RunReport,
    aggregate: StageStatus,
    package: StageStatus,
    start: Instant,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    for status in [&aggregate, &package] {
        if let StageStatus::Aborted(error) = status {
            report.aborted = Some(error.clone());
        }
    }

    report.finished_at = Local::now();
    assembler::write_report(&layout.report, &report)?;

    let result = RunResult {
        layout,
        report,
        aggregate,
        package,
        elapsed: start.elapsed(),
    };

    info!(
        summaries = result.report.summaries_written,
        chapters = result.report.chapter_count,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "run complete"
    );
    progress.done(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
