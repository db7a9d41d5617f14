//! Result type alias for the retriever
//!
//! This module provides a convenient Result type alias that uses RetrieverError
//! as the error type.

use super::errors::RetrieverError;

/// Result type alias for retriever operations
///
/// # Examples
///
/// ```
/// use data_retriever::domain::result::Result;
/// use data_retriever::domain::errors::RetrieverError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RetrieverError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RetrieverError>;
