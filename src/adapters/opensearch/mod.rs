//! OpenSearch persistence sink
//!
//! Entity mappings are written with the `_bulk` API, one document per mapping.

pub mod bulk;
pub mod client;
pub mod models;

pub use bulk::{build_bulk_body, bulk_write_mappings, BulkWriteFailure, BulkWriteResult};
pub use client::OpenSearchClient;
pub use models::MappingDocument;

use crate::domain::{EntityMapping, Result};
use async_trait::async_trait;

/// Destination for the mappings produced by a run
#[async_trait]
pub trait MappingSink: Send + Sync {
    /// Persist the mappings
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the write as a whole.
    async fn write_mappings(&self, mappings: &[EntityMapping]) -> Result<BulkWriteResult>;
}

#[async_trait]
impl MappingSink for OpenSearchClient {
    async fn write_mappings(&self, mappings: &[EntityMapping]) -> Result<BulkWriteResult> {
        bulk_write_mappings(self, mappings).await
    }
}
