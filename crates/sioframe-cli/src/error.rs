//! CLI error types.

use std::io;

use thiserror::Error;

use crate::tracing::TracingError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Encoding or decoding failed.
    #[error("parser error: {0}")]
    Parser(#[from] sioframe_parser::ParserError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A packet document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A binary value or frame line is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Logging could not be initialized.
    #[error("tracing setup failed: {0}")]
    Tracing(#[from] TracingError),

    /// Some inputs could not be processed.
    #[error("{failed} of {total} inputs failed")]
    Failed { failed: usize, total: usize },
}

impl CliError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
