//! Post-processors applied to matched metadata
//!
//! A post-processor is looked up by the name configured on a source and
//! applied to each matched group before it becomes a link's metadata.
//! Every processor receives the full [`PostProcessContext`]; processors that
//! do not need the context simply ignore it.
//!
//! # Example
//!
//! ```
//! use data_retriever::core::postprocess::{PostProcessContext, PostProcessorRegistry};
//! use serde_json::{json, Map};
//!
//! let registry = PostProcessorRegistry::builtin();
//! let processor = registry.get("clean_idc_metadata").unwrap();
//!
//! let entity = Map::new();
//! let context = PostProcessContext::new(&entity, "clinical_study_designation", "icdc_glioma");
//! let cleaned = processor.apply(json!([{"description": "<b>Canine</b> glioma"}]), &context);
//! assert_eq!(cleaned[0]["description"], "Canine glioma");
//! ```

pub mod html;
pub mod merge;
pub mod tcia;

pub use html::{html_to_text, CleanIdcMetadata};
pub use merge::merge_additive;
pub use tcia::AggregateTciaSeries;

use crate::domain::{match_value, Entity};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Context available to a post-processor
#[derive(Debug, Clone, Copy)]
pub struct PostProcessContext<'a> {
    /// Entity the group matched
    pub entity: &'a Entity,

    /// Entity field holding its identifier
    pub entity_id_key: &'a str,

    /// Matched value from the group (collection id)
    pub collection_id: &'a str,
}

impl<'a> PostProcessContext<'a> {
    /// Create a context
    pub fn new(entity: &'a Entity, entity_id_key: &'a str, collection_id: &'a str) -> Self {
        Self {
            entity,
            entity_id_key,
            collection_id,
        }
    }

    /// Entity identifier as a string, if present
    pub fn entity_id(&self) -> Option<String> {
        self.entity.get(self.entity_id_key).and_then(match_value)
    }
}

/// A named metadata transform
pub trait PostProcessor: Send + Sync {
    /// Name used in source configuration
    fn name(&self) -> &'static str;

    /// Transform a matched group's metadata
    fn apply(&self, metadata: Value, context: &PostProcessContext<'_>) -> Value;
}

/// Name-indexed table of post-processors
#[derive(Clone, Default)]
pub struct PostProcessorRegistry {
    processors: BTreeMap<&'static str, Arc<dyn PostProcessor>>,
}

impl PostProcessorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in processor
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CleanIdcMetadata));
        registry.register(Arc::new(AggregateTciaSeries));
        registry
    }

    /// Add or replace a processor under its own name
    pub fn register(&mut self, processor: Arc<dyn PostProcessor>) {
        self.processors.insert(processor.name(), processor);
    }

    /// Look up a processor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PostProcessor>> {
        self.processors.get(name).cloned()
    }

    /// Resolve an optional configured name
    ///
    /// An unknown name behaves as if none were configured, with a warning.
    pub fn resolve(&self, name: Option<&str>) -> Option<Arc<dyn PostProcessor>> {
        let name = name.filter(|n| !n.is_empty())?;
        let processor = self.get(name);
        if processor.is_none() {
            tracing::warn!(post_processor = %name, "Unknown post-processor, skipping");
        }
        processor
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.keys().copied().collect()
    }
}

impl std::fmt::Debug for PostProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostProcessorRegistry")
            .field("processors", &self.names())
            .finish()
    }
}
