//! Entity-to-dataset mapping for one source
//!
//! For every entity, each group of the source's dataset is reduced to one
//! candidate id (the first record with a value at the match key). Candidates
//! that fuzzy-match the entity id become [`LinkRecord`]s, after the source's
//! post-processor (if any) has transformed the group.

use crate::config::SourceConfig;
use crate::core::fetch::render_template;
use crate::core::matching::FuzzyMatcher;
use crate::core::postprocess::{PostProcessContext, PostProcessor, PostProcessorRegistry};
use crate::domain::{
    match_value, Dataset, Entity, EntityMapping, FetchError, Group, LinkRecord, Result,
};
use serde_json::Value;
use std::sync::Arc;

/// First non-empty value at `match_key` within a group
///
/// Later records carrying a value are ignored.
pub fn first_valid_match(group: &Group, match_key: &str) -> Option<String> {
    group
        .records()
        .iter()
        .find_map(|record| record.get(match_key).and_then(match_value))
}

/// Maps entities against one source's dataset
pub struct Mapper {
    repository: String,
    match_key: String,
    entity_id_key: String,
    dataset_base_url: String,
    dataset_base_url_param: String,
    post_processor: Option<Arc<dyn PostProcessor>>,
    matcher: FuzzyMatcher,
}

impl Mapper {
    /// Build the mapper for a secondary source
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::MissingField`] if the source lacks a match key or
    /// dataset URL settings.
    pub fn for_source(
        source: &SourceConfig,
        registry: &PostProcessorRegistry,
        matcher: FuzzyMatcher,
    ) -> Result<Self> {
        let missing = |field: &str| FetchError::MissingField {
            source_name: source.name.clone(),
            field: field.to_string(),
        };

        let match_key = source.resolved_match_key().ok_or_else(|| missing("match_key"))?;
        let dataset_base_url = source
            .dataset_base_url
            .clone()
            .ok_or_else(|| missing("dataset_base_url"))?;
        let dataset_base_url_param = source
            .dataset_base_url_param
            .clone()
            .ok_or_else(|| missing("dataset_base_url_param"))?;

        Ok(Self {
            repository: source.name.clone(),
            match_key: match_key.to_string(),
            entity_id_key: source.entity_id_key.clone(),
            dataset_base_url,
            dataset_base_url_param,
            post_processor: registry.resolve(source.post_processor.as_deref()),
            matcher,
        })
    }

    /// Links for one entity, in group order
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset URL template cannot be rendered.
    pub fn map_entity(&self, entity: &Entity, dataset: &Dataset) -> Result<Vec<LinkRecord>> {
        let Some(entity_id) = entity.get(&self.entity_id_key).and_then(match_value) else {
            tracing::debug!(
                entity_id_key = %self.entity_id_key,
                "Entity has no id value, skipping"
            );
            return Ok(Vec::new());
        };

        let mut links = Vec::new();
        for group in dataset.groups() {
            let Some(candidate) = first_valid_match(group, &self.match_key) else {
                tracing::warn!(
                    source = %self.repository,
                    match_key = %self.match_key,
                    "Match key not present in metadata"
                );
                continue;
            };

            if !self.matcher.is_match(&entity_id, &candidate) {
                tracing::trace!(entity_id = %entity_id, candidate = %candidate, "No match");
                continue;
            }

            let mut metadata = group.clone().into_value();
            if let Some(processor) = &self.post_processor {
                let context = PostProcessContext::new(entity, &self.entity_id_key, &candidate);
                metadata = processor.apply(metadata, &context);
                tracing::debug!(post_processor = processor.name(), "Applied post-processor");
            }

            let url =
                render_template(&self.dataset_base_url, &self.dataset_base_url_param, &candidate)?;
            links.push(LinkRecord {
                repository: self.repository.clone(),
                url,
                metadata,
            });
        }

        tracing::debug!(entity_id = %entity_id, links = links.len(), "Links mapped for entity");
        Ok(links)
    }

    /// One mapping per entity with at least one link
    ///
    /// # Errors
    ///
    /// See [`Mapper::map_entity`].
    pub fn collect_mappings(
        &self,
        entities: &[Entity],
        dataset: &Dataset,
    ) -> Result<Vec<EntityMapping>> {
        let mut mappings = Vec::new();
        for entity in entities {
            let links = self.map_entity(entity, dataset)?;
            if links.is_empty() {
                continue;
            }

            let entity_id = entity.get(&self.entity_id_key).cloned().unwrap_or(Value::Null);
            tracing::info!(
                source = %self.repository,
                entity_id = %entity_id,
                links = links.len(),
                "Mapped collections to entity"
            );
            mappings.push(EntityMapping { entity_id, links });
        }
        Ok(mappings)
    }

    /// Source name used as the links' repository
    pub fn repository(&self) -> &str {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscoveryConfig, FetchKind, FetchTemplateConfig};
    use serde_json::{json, Map};

    fn records(value: Value) -> Group {
        Group::from_value(value)
    }

    fn entity(id: Value) -> Entity {
        let mut entity = Map::new();
        entity.insert("clinical_study_designation".to_string(), id);
        entity
    }

    fn idc_source() -> SourceConfig {
        SourceConfig {
            name: "IDC".to_string(),
            kind: FetchKind::Direct,
            api_base_url: "https://api.imaging.datacommons.cancer.gov".to_string(),
            entity_id_key: "clinical_study_designation".to_string(),
            endpoint: Some("/v2/collections".to_string()),
            match_key: Some("collection_id".to_string()),
            dataset_base_url: Some("https://portal.imaging.datacommons.cancer.gov/explore/filters/?collection_id={collection_id}".to_string()),
            dataset_base_url_param: Some("collection_id".to_string()),
            ..Default::default()
        }
    }

    fn mapper(source: &SourceConfig) -> Mapper {
        Mapper::for_source(source, &PostProcessorRegistry::builtin(), FuzzyMatcher::default())
            .unwrap()
    }

    #[test]
    fn test_first_valid_match_policy() {
        let group = records(json!([{"x": ""}, {"x": "value"}, {"x": "ignored"}]));
        assert_eq!(first_valid_match(&group, "x"), Some("value".to_string()));
    }

    #[test]
    fn test_first_valid_match_absent() {
        let group = records(json!([{"x": null}, {"y": "other"}]));
        assert_eq!(first_valid_match(&group, "x"), None);
    }

    #[test]
    fn test_map_entity_produces_templated_link() {
        let dataset = Dataset::from_value(json!([
            {"collection_id": "icdc_glioma", "description": "glioma"},
            {"collection_id": "tcga_gbm"}
        ]));
        // A flat list is one group, so only the first collection id is a candidate
        let links = mapper(&idc_source())
            .map_entity(&entity(json!("GLIOMA01")), &dataset)
            .unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].repository, "IDC");
        assert!(links[0].url.ends_with("collection_id=icdc_glioma"));
        assert_eq!(links[0].metadata.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_one_link_per_matching_group() {
        let dataset = Dataset::from_value(json!([
            [{"collection_id": "icdc_glioma"}],
            [{"collection_id": "canine"}],
            [{"collection_id": ""}, {"collection_id": "glioma_extra"}],
            [{"unrelated": 1}]
        ]));
        let links = mapper(&idc_source())
            .map_entity(&entity(json!("GLIOMA01")), &dataset)
            .unwrap();

        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(links.len(), 2);
        assert!(urls[0].ends_with("icdc_glioma"));
        assert!(urls[1].ends_with("glioma_extra"));
    }

    #[test]
    fn test_entity_without_id_maps_nothing() {
        let dataset = Dataset::from_value(json!([{"collection_id": "icdc_glioma"}]));
        let links = mapper(&idc_source()).map_entity(&Map::new(), &dataset).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_collect_mappings_skips_unmatched_entities() {
        let dataset = Dataset::from_value(json!([
            [{"collection_id": "icdc_glioma"}],
            [{"collection_id": "icdc_osteosarcoma"}]
        ]));
        let entities = vec![entity(json!("GLIOMA01")), entity(json!("LYMPHOMA99"))];
        let mappings = mapper(&idc_source()).collect_mappings(&entities, &dataset).unwrap();

        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].entity_id, json!("GLIOMA01"));
        assert_eq!(mappings[0].link_count(), 1);
    }

    #[test]
    fn test_post_processor_receives_context() {
        let source = SourceConfig {
            name: "TCIA".to_string(),
            kind: FetchKind::Discovery,
            api_base_url: "https://services.cancerimagingarchive.net".to_string(),
            entity_id_key: "clinical_study_designation".to_string(),
            discovery: Some(DiscoveryConfig {
                endpoint: "/getCollectionValues".to_string(),
                match_key: "Collection".to_string(),
                filter_prefix: "ICDC-".to_string(),
            }),
            fetch: Some(FetchTemplateConfig {
                endpoint_template: "/getSeries?Collection={collection_id}".to_string(),
                key_param: "collection_id".to_string(),
                match_key: None,
            }),
            dataset_base_url: Some("https://www.cancerimagingarchive.net/collection/{collection_id}".to_string()),
            dataset_base_url_param: Some("collection_id".to_string()),
            post_processor: Some("aggregate_tcia_series_data".to_string()),
            ..Default::default()
        };
        let dataset = Dataset::from_value(json!([[
            {"Collection": "ICDC-Glioma", "PatientID": "1", "Modality": "MR", "BodyPartExamined": "HEAD", "ImageCount": 10},
            {"Collection": "ICDC-Glioma", "PatientID": "2", "Modality": "MR", "BodyPartExamined": "HEAD", "ImageCount": 5}
        ]]));

        let links = mapper(&source)
            .map_entity(&entity(json!("GLIOMA01")), &dataset)
            .unwrap();

        assert_eq!(links.len(), 1);
        let metadata = &links[0].metadata;
        assert_eq!(metadata["Collection"], json!("ICDC-Glioma"));
        assert_eq!(metadata["Aggregate_PatientID"], json!(2));
        // GLIOMA01 carries the fixed histopathology offset
        assert_eq!(metadata["Aggregate_ImageCount"], json!(99));
        assert_eq!(links[0].url, "https://www.cancerimagingarchive.net/collection/ICDC-Glioma");
    }

    #[test]
    fn test_for_source_requires_match_key() {
        let mut source = idc_source();
        source.match_key = None;
        let registry = PostProcessorRegistry::builtin();
        assert!(Mapper::for_source(&source, &registry, FuzzyMatcher::default()).is_err());
    }

    #[test]
    fn test_numeric_entity_ids() {
        let mut source = idc_source();
        source.match_key = Some("study".to_string());
        let dataset = Dataset::from_value(json!([[{"study": 1}], [{"study": 2}]]));
        let links = mapper(&source).map_entity(&entity(json!(1)), &dataset).unwrap();
        assert_eq!(links.len(), 1);
        assert!(links[0].url.ends_with("collection_id=1"));
    }
}
