//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use summarybook_core::assembler::OutputLayout;
use summarybook_core::pipeline::{self, ProgressReporter, RunResult};
use summarybook_shared::{
    AppConfig, RunConfig, config_file_path, init_config, load_config, load_config_from,
    resolve_api_key,
};
use summarybook_summarizer::GeminiClient;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SummaryBook: summarize articles with Gemini and bind them into an e-book.
#[derive(Parser)]
#[command(
    name = "summarybook",
    version,
    about = "Summarize a folder of articles with Gemini and package the summaries as an EPUB.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.summarybook/summarybook.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Summarize, aggregate and package in one run.
    Run {
        #[command(flatten)]
        paths: PathArgs,

        /// Seconds to wait after each service call.
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Only write per-article summaries.
    Summarize {
        #[command(flatten)]
        paths: PathArgs,

        /// Seconds to wait after each service call.
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Aggregate an existing summary tree into a document, then package it.
    Aggregate {
        /// Directory holding `*_summary.txt` files.
        #[arg(long)]
        summaries: PathBuf,

        /// Output root for the document, e-book and report.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Package an existing aggregated document as an EPUB.
    Package {
        /// Aggregated DOCX document.
        #[arg(long)]
        document: PathBuf,

        /// EPUB path (defaults to the document path with `.epub`).
        #[arg(long)]
        epub: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Input/output directory overrides.
#[derive(clap::Args)]
pub(crate) struct PathArgs {
    /// Directory tree of `.txt` articles.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output root for summaries, document, e-book and report.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "summarybook=info",
        1 => "summarybook=debug",
        _ => "summarybook=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { paths, delay } => cmd_run(config_path, &paths, delay).await,
        Command::Summarize { paths, delay } => cmd_summarize(config_path, &paths, delay).await,
        Command::Aggregate { summaries, output } => {
            cmd_aggregate(config_path, &summaries, output.as_deref())
        }
        Command::Package { document, epub } => {
            cmd_package(config_path, &document, epub.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    Ok(match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Merge CLI overrides into the file config.
fn run_config(config: &AppConfig, paths: &PathArgs, delay: Option<u64>) -> RunConfig {
    let mut run = RunConfig::from(config);
    if let Some(input) = &paths.input {
        run.input_dir = input.clone();
    }
    if let Some(output) = &paths.output {
        run.output_root = output.clone();
    }
    if let Some(secs) = delay {
        run.delay = Duration::from_secs(secs);
    }
    run
}

fn gemini_client(config: &AppConfig) -> Result<GeminiClient> {
    let api_key = resolve_api_key(config)?;
    Ok(GeminiClient::new(
        &config.gemini.base_url,
        api_key,
        Duration::from_secs(config.gemini.timeout_secs),
    )?)
}

async fn cmd_run(config_path: Option<&Path>, paths: &PathArgs, delay: Option<u64>) -> Result<()> {
    let config = load(config_path)?;
    let run = run_config(&config, paths, delay);
    let client = gemini_client(&config)?;

    info!(
        input = %run.input_dir.display(),
        output = %run.output_root.display(),
        "starting summarybook run"
    );

    let reporter = CliProgress::new();
    let result = pipeline::run(&run, client, &reporter).await?;
    print_run(&result);
    check_aborted(&result)
}

async fn cmd_summarize(
    config_path: Option<&Path>,
    paths: &PathArgs,
    delay: Option<u64>,
) -> Result<()> {
    let config = load(config_path)?;
    let run = run_config(&config, paths, delay);
    let client = gemini_client(&config)?;
    let layout = OutputLayout::today(&run.output_root);

    let reporter = CliProgress::new();
    let output = pipeline::summarize_all(&run, client, &layout.summaries_dir, &reporter).await?;
    reporter.spinner.finish_and_clear();

    println!();
    println!("  Summaries written!");
    println!("  Articles:  {}", output.discovered);
    println!("  Written:   {}", output.artifacts.len());
    println!("  Skipped:   {}", output.skipped.len());
    for skip in &output.skipped {
        println!("    - {}: {}", skip.path.display(), skip.reason);
    }
    println!("  Path:      {}", layout.summaries_dir.display());
    println!();

    Ok(())
}

fn cmd_aggregate(
    config_path: Option<&Path>,
    summaries: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let config = load(config_path)?;
    let mut run = RunConfig::from(&config);
    if let Some(output) = output {
        run.output_root = output.to_path_buf();
    }

    let reporter = CliProgress::new();
    let result = pipeline::aggregate_existing(&run, summaries, &reporter)?;
    print_run(&result);
    check_aborted(&result)
}

fn cmd_package(config_path: Option<&Path>, document: &Path, epub: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let run = RunConfig::from(&config);
    let epub_path = epub
        .map(Path::to_path_buf)
        .unwrap_or_else(|| document.with_extension("epub"));

    let ebook = pipeline::package_document(&run, document, &epub_path)?;

    println!();
    println!("  E-book created!");
    println!("  Chapters: {}", ebook.chapters.len());
    println!("  Path:     {}", epub_path.display());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", path.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_run(result: &RunResult) {
    let report = &result.report;

    println!();
    println!("  Run finished");
    println!("  Articles:   {}", report.articles_discovered);
    println!("  Summaries:  {}", report.summaries_written);
    println!("  Aggregated: {}", report.summaries_aggregated);
    println!("  Chapters:   {}", report.chapter_count);
    if !report.under_length.is_empty() {
        println!("  Short:      {}", report.under_length.len());
    }
    println!("  Skipped:    {}", report.skipped.len());
    for skip in &report.skipped {
        println!("    - {}: {}", skip.path.display(), skip.reason);
    }
    println!("  Aggregate:  {}", result.aggregate);
    println!("  Package:    {}", result.package);
    println!("  Document:   {}", result.layout.document.display());
    println!("  E-book:     {}", result.layout.ebook.display());
    println!("  Report:     {}", result.layout.report.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

fn check_aborted(result: &RunResult) -> Result<()> {
    match &result.report.aborted {
        Some(error) => Err(eyre!("run aborted: {error}")),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article_done(&self, path: &Path, current: usize, total: usize) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.spinner
            .set_message(format!("Summarizing [{current}/{total}] {name}"));
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
