//! OpenSearch document and bulk-response models

use crate::domain::{EntityMapping, LinkRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Document stored per entity mapping
///
/// Field names follow the index mapping consumed by the portal.
#[derive(Debug, Clone, Serialize)]
pub struct MappingDocument<'a> {
    /// Entity identifier
    pub entity_id: &'a Value,

    /// Dataset links for the entity
    #[serde(rename = "CRDCLinks")]
    pub links: &'a [LinkRecord],
}

impl<'a> From<&'a EntityMapping> for MappingDocument<'a> {
    fn from(mapping: &'a EntityMapping) -> Self {
        Self {
            entity_id: &mapping.entity_id,
            links: &mapping.links,
        }
    }
}

/// Response body of `POST /_bulk`
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResponse {
    /// True when at least one item failed
    #[serde(default)]
    pub errors: bool,

    /// One entry per action, keyed by action name (`index`)
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

/// Outcome of one bulk action
#[derive(Debug, Clone, Deserialize)]
pub struct BulkItem {
    /// Document id assigned by the cluster
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    /// HTTP status of this action
    pub status: u16,

    /// Error object when the action failed
    #[serde(default)]
    pub error: Option<Value>,
}

impl BulkItem {
    /// Whether the action was accepted
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.error.is_none()
    }

    /// Short description of the failure, if any
    pub fn error_reason(&self) -> String {
        match &self.error {
            Some(Value::Object(err)) => err
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(err.clone()).to_string()),
            Some(other) => other.to_string(),
            None => format!("status {}", self.status),
        }
    }
}
