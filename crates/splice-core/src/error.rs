//! Unified error handling for Splice Core.
//!
//! Every fallible operation in the core returns [`SpliceResult`]. Each
//! variant maps to one class of the error taxonomy (parse, not-found, I/O,
//! template) and carries user-actionable suggestions for the CLI layer.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root error type for Splice Core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpliceError {
    /// The input is not valid Rust source.
    #[error("Parse error in {path}:{line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// A requested declaration does not exist where it was expected.
    #[error("{what} not found in {location}")]
    NotFound { what: String, location: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// Undefined variable or malformed template syntax.
    #[error("Template error: {reason}")]
    Template { reason: String },

    /// An anchor pattern could not be compiled.
    #[error("Invalid anchor pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The request itself is unusable (destination clash, bad arguments).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Configuration or setup errors.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl SpliceError {
    /// Build a parse error from a `syn` diagnostic.
    pub fn parse(path: impl AsRef<Path>, err: &syn::Error) -> Self {
        let start = err.span().start();
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            line: start.line,
            column: start.column + 1,
            message: err.to_string(),
        }
    }

    /// Build an I/O error for `path`, describing the failed operation.
    pub fn io(path: impl AsRef<Path>, operation: &str, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            reason: format!("Failed to {operation}: {err}"),
        }
    }

    pub fn not_found(what: impl Into<String>, location: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            location: location.into(),
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Parse { path, line, .. } => vec![
                format!("Fix the syntax error near {}:{}", path.display(), line),
                "Run `cargo check` to see the compiler's diagnostic".into(),
            ],
            Self::NotFound { what, location } => vec![
                format!("Check that {what} is declared in {location}"),
                "Names are case-sensitive; methods must live in an inherent impl block".into(),
            ],
            Self::Io { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::Template { .. } => vec![
                "Check that every variable used by the template is supplied".into(),
                "Check the template for unbalanced {% %} / {{ }} blocks".into(),
            ],
            Self::InvalidPattern { .. } => vec![
                "Escape regex metacharacters or drop --regex to match literally".into(),
            ],
            Self::InvalidRequest { reason } => vec![
                format!("Request rejected: {reason}"),
                "Use --help for usage information".into(),
            ],
            Self::Configuration { message } => vec![
                format!("Configuration issue: {}", message),
                "Check your setup and try again".into(),
            ],
            Self::Internal { .. } => vec![
                "This appears to be a bug in Splice".into(),
                "Please report this issue at: https://github.com/cosecruz/splice/issues".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parse { .. }
            | Self::Template { .. }
            | Self::InvalidPattern { .. }
            | Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Io { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Configuration,
    Internal,
}

/// Convenient result type alias.
pub type SpliceResult<T> = Result<T, SpliceError>;
