//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only raised while setting up clients; a dispatch pass itself never fails.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Client creation error
    #[error("failed to create client '{name}': {message}")]
    ClientCreation { name: String, message: String },
}

impl DispatcherError {
    /// Create a client creation error
    pub fn client_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
