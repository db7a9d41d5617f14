//! Bulk writes of entity mappings
//!
//! Mappings are sent in one `_bulk` request: an `index` action line followed
//! by the document line, per mapping.

use super::client::OpenSearchClient;
use super::models::{BulkResponse, MappingDocument};
use crate::domain::{EntityMapping, OutputError, Result};
use serde_json::json;

/// Result of a bulk write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteResult {
    /// Documents sent to the cluster
    pub attempted: usize,

    /// Documents the cluster acknowledged
    pub success_count: usize,

    /// Documents rejected by the cluster
    pub failure_count: usize,

    /// Details of rejected documents
    pub failures: Vec<BulkWriteFailure>,
}

/// Details of a rejected document
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteFailure {
    /// Entity the document belonged to
    pub entity_id: String,

    /// Error reported by the cluster
    pub error: String,
}

/// Build the NDJSON body for a bulk index request
///
/// Documents that fail to serialize are skipped with a warning. Returns the
/// body and the entity ids included, in order.
pub fn build_bulk_body(index: &str, mappings: &[EntityMapping]) -> (String, Vec<String>) {
    let action = json!({"index": {"_index": index}}).to_string();
    let mut body = String::new();
    let mut included = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        match serde_json::to_string(&MappingDocument::from(mapping)) {
            Ok(doc) => {
                body.push_str(&action);
                body.push('\n');
                body.push_str(&doc);
                body.push('\n');
                included.push(entity_label(mapping));
            }
            Err(e) => {
                tracing::warn!(
                    entity_id = %entity_label(mapping),
                    error = %e,
                    "Skipping unserializable document"
                );
            }
        }
    }

    (body, included)
}

/// Write entity mappings to the client's index
///
/// # Errors
///
/// Returns an error if the request fails as a whole or the response cannot
/// be parsed. Per-document rejections are reported in the result.
pub async fn bulk_write_mappings(
    client: &OpenSearchClient,
    mappings: &[EntityMapping],
) -> Result<BulkWriteResult> {
    let (body, included) = build_bulk_body(client.index(), mappings);
    if included.is_empty() {
        tracing::info!(index = %client.index(), "No documents to write");
        return Ok(BulkWriteResult::default());
    }

    let text = client.post_bulk(body).await?;
    let response: BulkResponse = serde_json::from_str(&text)
        .map_err(|e| OutputError::InvalidResponse(format!("bulk response: {e}")))?;

    let mut result = BulkWriteResult {
        attempted: included.len(),
        ..Default::default()
    };

    for (position, item) in response.items.iter().flat_map(|i| i.values()).enumerate() {
        if item.is_success() {
            result.success_count += 1;
        } else {
            let entity_id = included
                .get(position)
                .cloned()
                .unwrap_or_else(|| item.id.clone().unwrap_or_default());
            tracing::warn!(
                entity_id = %entity_id,
                error = %item.error_reason(),
                "Document rejected by OpenSearch"
            );
            result.failures.push(BulkWriteFailure {
                entity_id,
                error: item.error_reason(),
            });
        }
    }
    result.failure_count = result.failures.len();

    tracing::info!(
        index = %client.index(),
        written = result.success_count,
        attempted = result.attempted,
        "Wrote {} out of {} documents to index {}",
        result.success_count,
        result.attempted,
        client.index()
    );

    Ok(result)
}

fn entity_label(mapping: &EntityMapping) -> String {
    match &mapping.entity_id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
