//! Domain models and types for the retriever.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Record types** ([`Record`], [`Entity`], [`Group`], [`Dataset`])
//! - **Output types** ([`LinkRecord`], [`EntityMapping`])
//! - **Error types** ([`RetrieverError`], [`FetchError`], [`OutputError`])
//! - **Result type alias** ([`Result`])
//!
//! # Normalized metadata
//!
//! ```rust
//! use data_retriever::domain::Dataset;
//! use serde_json::json;
//!
//! // A flat list of records is one group
//! let flat = Dataset::from_value(json!([{"collection_id": "a"}, {"collection_id": "b"}]));
//! assert_eq!(flat.group_count(), 1);
//!
//! // A list of lists is one group per inner list
//! let nested = Dataset::from_value(json!([[{"collection_id": "a"}], [{"collection_id": "b"}]]));
//! assert_eq!(nested.group_count(), 2);
//! ```

pub mod errors;
pub mod records;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{FetchError, OutputError, RetrieverError};
pub use records::{match_value, Dataset, Entity, EntityMapping, Group, LinkRecord, Record};
pub use result::Result;
