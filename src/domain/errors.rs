//! Domain error types
//!
//! This module defines the error hierarchy for the retriever. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main retriever error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum RetrieverError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Source fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Output sink errors
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Notification errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while retrieving data from one external source
///
/// Transport failures, non-success statuses and malformed bodies are kept
/// apart so callers can log them distinctly.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request never produced a response
    #[error("Failed to connect to {url}: {message}")]
    ConnectionFailed { url: String, message: String },

    /// Connect or read timeout elapsed
    #[error("Request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    /// Server answered with a non-success status
    #[error("Request to {url} failed with status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Body could not be decoded as JSON
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    /// URL template references a parameter that has no value
    #[error("Missing key in endpoint template '{template}': {parameter}")]
    MissingTemplateParameter { template: String, parameter: String },

    /// Source configuration lacks a field its fetch kind needs
    #[error("Source '{source_name}' is missing required field '{field}'")]
    MissingField { source_name: String, field: String },
}

/// Errors raised by the persistence sink
#[derive(Debug, Error)]
pub enum OutputError {
    /// Sink host unreachable or refused the connectivity check
    #[error("Failed to connect to output host {host}: {message}")]
    ConnectionFailed { host: String, message: String },

    /// Credentials were not provided in the environment
    #[error("Output credentials not provided: {0}")]
    MissingCredentials(String),

    /// Bulk request was rejected as a whole
    #[error("Bulk write to index '{index}' failed: {message}")]
    BulkRejected { index: String, message: String },

    /// Sink replied with something other than the expected JSON
    #[error("Invalid response from output host: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether the failure came from the network rather than from the server or config
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::ConnectionFailed { .. } | FetchError::Timeout { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for RetrieverError {
    fn from(err: std::io::Error) -> Self {
        RetrieverError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RetrieverError {
    fn from(err: serde_json::Error) -> Self {
        RetrieverError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RetrieverError {
    fn from(err: toml::de::Error) -> Self {
        RetrieverError::Configuration(format!("TOML parse error: {err}"))
    }
}
