//! Application configuration for SummaryBook.
//!
//! User config lives at `~/.summarybook/summarybook.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SummaryBookError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "summarybook.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".summarybook";

// ---------------------------------------------------------------------------
// Config structs (matching summarybook.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Gemini service settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Summarizer stage settings.
    #[serde(default)]
    pub summarize: SummarizeConfig,

    /// Aggregator stage settings.
    #[serde(default)]
    pub aggregate: AggregateConfig,

    /// E-book metadata.
    #[serde(default)]
    pub book: BookConfig,
}

/// Language of the prompt and of every e-book document.
pub const LANGUAGE_TAG: &str = "vi";

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory tree holding the raw `.txt` articles.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Root under which summaries, the document and the e-book are written.
    #[serde(default = "default_output_root")]
    pub output_root: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_root: default_output_root(),
        }
    }
}

fn default_input_dir() -> String {
    "articles".into()
}
fn default_output_root() -> String {
    "summaries".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Optional file holding the API key, read when the env var is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<String>,

    /// Base URL of the generative-language API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Models rotated through during a run.
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    /// Accepted summaries before switching to the next model.
    #[serde(default = "default_summaries_per_model")]
    pub summaries_per_model: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_key_file: None,
            base_url: default_base_url(),
            models: default_models(),
            summaries_per_model: default_summaries_per_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_models() -> Vec<String> {
    vec!["gemini-2.5-flash".into(), "gemini-2.5-flash".into()]
}
fn default_summaries_per_model() -> u32 {
    1
}
fn default_timeout_secs() -> u64 {
    300
}

/// `[summarize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeConfig {
    /// Articles with fewer whitespace-delimited words are skipped.
    #[serde(default = "default_min_words")]
    pub min_words: usize,

    /// Length the prompt asks for; shorter summaries are flagged.
    #[serde(default = "default_expected_summary_words")]
    pub expected_summary_words: usize,

    /// Pause after every service call, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Appended to the source file stem to name the summary artifact.
    #[serde(default = "default_summary_suffix")]
    pub summary_suffix: String,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            expected_summary_words: default_expected_summary_words(),
            delay_secs: default_delay_secs(),
            summary_suffix: default_summary_suffix(),
        }
    }
}

fn default_min_words() -> usize {
    50
}
fn default_expected_summary_words() -> usize {
    2000
}
fn default_delay_secs() -> u64 {
    5
}
fn default_summary_suffix() -> String {
    "_summary".into()
}

/// `[aggregate]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Lines containing any of these phrases (case-insensitive) are dropped.
    #[serde(default = "default_boilerplate_phrases")]
    pub boilerplate_phrases: Vec<String>,

    /// Phrase that marks the title line of a summary.
    #[serde(default = "default_title_marker")]
    pub title_marker: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            boilerplate_phrases: default_boilerplate_phrases(),
            title_marker: default_title_marker(),
        }
    }
}

fn default_boilerplate_phrases() -> Vec<String> {
    vec!["Dưới đây là bản tóm tắt chi tiết nội dung của đoạn văn bằng tiếng Việt".into()]
}
fn default_title_marker() -> String {
    "tên bài".into()
}

/// `[book]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    /// E-book title shown by readers.
    #[serde(default = "default_book_title")]
    pub title: String,

    /// Value of the package `dc:identifier`.
    #[serde(default = "default_book_identifier")]
    pub identifier: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: default_book_title(),
            identifier: default_book_identifier(),
        }
    }
}

fn default_book_title() -> String {
    "Tóm tắt bằng AI".into()
}
fn default_book_identifier() -> String {
    "Tóm tắt bằng AI".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one pipeline run, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory tree holding the raw articles.
    pub input_dir: PathBuf,
    /// Root for every output artifact.
    pub output_root: PathBuf,
    /// Models rotated through during the run.
    pub models: Vec<String>,
    /// Accepted summaries per model before rotating.
    pub summaries_per_model: u32,
    /// Minimum article length in words.
    pub min_words: usize,
    /// Requested summary length in words.
    pub expected_summary_words: usize,
    /// Pause after every service call.
    pub delay: Duration,
    /// Summary artifact file name suffix.
    pub summary_suffix: String,
    /// Boilerplate phrases filtered from summaries.
    pub boilerplate_phrases: Vec<String>,
    /// Title marker phrase.
    pub title_marker: String,
    /// E-book title.
    pub book_title: String,
    /// E-book identifier.
    pub book_identifier: String,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            input_dir: PathBuf::from(&config.defaults.input_dir),
            output_root: PathBuf::from(&config.defaults.output_root),
            models: config.gemini.models.clone(),
            summaries_per_model: config.gemini.summaries_per_model,
            min_words: config.summarize.min_words,
            expected_summary_words: config.summarize.expected_summary_words,
            delay: Duration::from_secs(config.summarize.delay_secs),
            summary_suffix: config.summarize.summary_suffix.clone(),
            boilerplate_phrases: config.aggregate.boilerplate_phrases.clone(),
            title_marker: config.aggregate.title_marker.clone(),
            book_title: config.book.title.clone(),
            book_identifier: config.book.identifier.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.summarybook/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SummaryBookError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.summarybook/summarybook.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SummaryBookError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SummaryBookError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SummaryBookError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SummaryBookError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SummaryBookError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the Gemini API key: the configured env var first, then the key file.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    if let Ok(val) = std::env::var(var_name) {
        let val = val.trim();
        if !val.is_empty() {
            return Ok(val.to_string());
        }
    }

    if let Some(file) = &config.gemini.api_key_file {
        let path = Path::new(file);
        let key = std::fs::read_to_string(path).map_err(|e| SummaryBookError::io(path, e))?;
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
        return Err(SummaryBookError::config(format!(
            "API key file {} is empty",
            path.display()
        )));
    }

    Err(SummaryBookError::config(format!(
        "Gemini API key not found. Set the {var_name} environment variable \
         or `api_key_file` under [gemini]."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_root"));
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(!toml_str.contains("api_key_file"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.summarize.min_words, 50);
        assert_eq!(parsed.gemini.summaries_per_model, 1);
        assert_eq!(parsed.aggregate.title_marker, "tên bài");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
input_dir = "/data/raw"

[gemini]
models = ["gemini-2.5-pro"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.input_dir, "/data/raw");
        assert_eq!(config.defaults.output_root, "summaries");
        assert_eq!(config.gemini.models, vec!["gemini-2.5-pro".to_string()]);
        assert_eq!(config.summarize.delay_secs, 5);
    }

    #[test]
    fn legacy_language_key_is_ignored() {
        let toml_str = r#"
[defaults]
input_dir = "in"
language = "en"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.input_dir, "in");
        assert_eq!(LANGUAGE_TAG, "vi");
    }

    #[test]
    fn run_config_from_app_config() {
        let app = AppConfig::default();
        let run = RunConfig::from(&app);
        assert_eq!(run.min_words, 50);
        assert_eq!(run.delay, Duration::from_secs(5));
        assert_eq!(run.models.len(), 2);
    }

    #[test]
    fn api_key_missing() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.gemini.api_key_env = "SB_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn api_key_from_file() {
        let dir = std::env::temp_dir().join(format!("sb-config-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let key_path = dir.join("key.txt");
        std::fs::write(&key_path, "  secret-key\n").unwrap();

        let mut config = AppConfig::default();
        config.gemini.api_key_env = "SB_TEST_NONEXISTENT_KEY_67890".into();
        config.gemini.api_key_file = Some(key_path.to_string_lossy().to_string());

        assert_eq!(resolve_api_key(&config).unwrap(), "secret-key");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
