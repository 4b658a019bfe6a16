//! Layered error definitions
//!
//! Categorized by source: config / build / write

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Build Errors =====
    /// Write request could not be derived from a record
    #[error("request construction failed for record '{record_id}': {message}")]
    RequestBuild { record_id: String, message: String },

    // ===== Write Errors =====
    /// Bulk write to a destination failed
    #[error("write to '{destination}' failed: {message}")]
    WriteFailed {
        destination: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create request construction error
    pub fn request_build(record_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RequestBuild {
            record_id: record_id.into(),
            message: message.into(),
        }
    }

    /// Create bulk write error
    pub fn write_failed(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            destination: destination.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create bulk write error keeping the underlying cause
    pub fn write_failed_with(
        destination: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WriteFailed {
            destination: destination.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}
