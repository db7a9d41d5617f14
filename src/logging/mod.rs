//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output
//! - JSON-formatted local log files with rotation
//! - Configurable log levels, overridable with `RUST_LOG`
//!
//! # Example
//!
//! ```no_run
//! use data_retriever::logging::init_logging;
//! use data_retriever::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a source fetch
///
/// # Example
///
/// ```no_run
/// use data_retriever::log_fetch_start;
///
/// log_fetch_start!("TCIA", "discovery");
/// ```
#[macro_export]
macro_rules! log_fetch_start {
    ($source:expr, $kind:expr) => {
        tracing::info!(
            source = %$source,
            kind = %$kind,
            "Starting fetch from source"
        );
    };
}

/// Log the completion of a source fetch
///
/// # Example
///
/// ```no_run
/// use data_retriever::log_fetch_complete;
/// use std::time::Duration;
///
/// log_fetch_complete!("IDC", 1, 42, Duration::from_millis(350));
/// ```
#[macro_export]
macro_rules! log_fetch_complete {
    ($source:expr, $groups:expr, $records:expr, $duration:expr) => {
        tracing::info!(
            source = %$source,
            groups = $groups,
            records = $records,
            duration_ms = $duration.as_millis() as u64,
            "Successfully fetched data from source"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use data_retriever::log_error_with_context;
/// use data_retriever::domain::RetrieverError;
///
/// let error = RetrieverError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = %$context,
            "Error occurred"
        );
    };
}
