//! Error types for SummaryBook.
//!
//! Library crates use [`SummaryBookError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all SummaryBook operations.
#[derive(Debug, thiserror::Error)]
pub enum SummaryBookError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while calling the summarization service.
    #[error("network error: {0}")]
    Network(String),

    /// The summarization service answered with a non-success status.
    #[error("service error: HTTP {status}: {body}")]
    Service { status: u16, body: String },

    /// Response or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty input, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Rich-text document (DOCX) encoding or decoding error.
    #[error("document error: {0}")]
    Document(String),

    /// E-book (EPUB) packaging error.
    #[error("package error: {0}")]
    Package(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SummaryBookError>;

impl SummaryBookError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SummaryBookError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = SummaryBookError::Service {
            status: 429,
            body: "quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "service error: HTTP 429: quota exceeded");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = SummaryBookError::io(
            "/tmp/missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.txt"));
    }
}
