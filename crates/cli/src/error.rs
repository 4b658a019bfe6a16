//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// A records file line is not a valid record
    #[error("Invalid record at {}:{line}: {message}", path.display())]
    RecordParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Building components from configuration failed
    #[error("Failed to set up pipeline: {message}")]
    Setup { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn record_parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::RecordParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
