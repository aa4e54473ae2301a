//! Shared types, error model, and configuration for SummaryBook.
//!
//! This crate is the foundation depended on by all other SummaryBook crates.
//! It provides:
//! - [`SummaryBookError`]: the unified error type
//! - Domain types ([`SourceArticle`], [`SummaryArtifact`], [`AggregatedDocument`], [`EBook`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AggregateConfig, AppConfig, BookConfig, DefaultsConfig, GeminiConfig, LANGUAGE_TAG,
    RunConfig, SummarizeConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_api_key,
};
pub use error::{Result, SummaryBookError};
pub use types::{
    AggregatedDocument, ArtifactMeta, Chapter, DocumentBlock, EBook, Outcome, RunReport,
    SkipReason, SkipRecord, SourceArticle, SummaryArtifact, TocEntry, word_count,
};
