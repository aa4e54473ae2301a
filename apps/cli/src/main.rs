//! SummaryBook CLI: batch article summarizer and e-book builder.
//!
//! Summarizes a tree of plain-text articles with Gemini, combines the
//! summaries into one DOCX document, and packages that document as an EPUB.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
