//! Integration tests for the built-in post-processors

use data_retriever::core::postprocess::{
    html_to_text, merge_additive, PostProcessContext, PostProcessorRegistry,
};
use serde_json::{json, Map, Value};
use test_case::test_case;

fn entity(id: &str) -> Map<String, Value> {
    let mut entity = Map::new();
    entity.insert("clinical_study_designation".to_string(), json!(id));
    entity
}

#[test_case("<p>Dogs &amp; cats</p>", "Dogs & cats" ; "entity in paragraph")]
#[test_case("<div>One</div><div>Two</div>", "One Two" ; "adjacent blocks")]
#[test_case("Plain   text\n\nonly", "Plain text only" ; "whitespace collapse")]
#[test_case("<a href=\"https://idc.example\">link</a> text", "link text" ; "anchor keeps label")]
#[test_case("<p>Ages 2 < x > 1</p>", "Ages 2 < x > 1" ; "bare comparison signs")]
fn test_html_to_text(html: &str, expected: &str) {
    assert_eq!(html_to_text(html), expected);
}

#[test]
fn test_clean_idc_metadata_through_registry() {
    let registry = PostProcessorRegistry::builtin();
    let processor = registry.resolve(Some("clean_idc_metadata")).unwrap();
    let entity = entity("GLIOMA01");
    let context = PostProcessContext::new(&entity, "clinical_study_designation", "icdc_glioma");

    let result = processor.apply(
        json!([
            {"collection_id": "icdc_glioma", "description": "<p>Canine <em>glioma</em> study</p>"},
            {"collection_id": "icdc_glioma", "cancer_type": "Glioma"}
        ]),
        &context,
    );

    assert_eq!(result[0]["description"], json!("Canine glioma study"));
    // Records without a description pass through unchanged
    assert_eq!(result[1], json!({"collection_id": "icdc_glioma", "cancer_type": "Glioma"}));
}

#[test]
fn test_tcia_aggregation_without_correction() {
    let registry = PostProcessorRegistry::builtin();
    let processor = registry.get("aggregate_tcia_series_data").unwrap();
    let entity = entity("OSA01");
    let context = PostProcessContext::new(&entity, "clinical_study_designation", "ICDC-OSA01");

    let result = processor.apply(
        json!([
            {"Collection": "ICDC-OSA01", "PatientID": "a", "Modality": "CT", "BodyPartExamined": "LEG", "ImageCount": 40},
            {"Collection": "ICDC-OSA01", "PatientID": "b", "Modality": "CT", "BodyPartExamined": "CHEST", "ImageCount": 2},
            {"Collection": "ICDC-OSA01", "PatientID": "a", "Modality": "MR", "BodyPartExamined": "LEG", "ImageCount": 8}
        ]),
        &context,
    );

    assert_eq!(result["Collection"], json!("ICDC-OSA01"));
    assert_eq!(result["Aggregate_PatientID"], json!(2));
    assert_eq!(result["Aggregate_Modality"], json!(["CT", "MR"]));
    assert_eq!(result["Aggregate_BodyPartExamined"], json!(["CHEST", "LEG"]));
    assert_eq!(result["Aggregate_ImageCount"], json!(50));
}

#[test]
fn test_tcia_glioma01_correction_keys_on_entity_id() {
    let registry = PostProcessorRegistry::builtin();
    let processor = registry.get("aggregate_tcia_series_data").unwrap();
    let series = json!([
        {"Collection": "ICDC-Glioma", "PatientID": "a", "Modality": "MR", "BodyPartExamined": "BRAIN", "ImageCount": 16}
    ]);

    let glioma = entity("GLIOMA01");
    let corrected = processor.apply(
        series.clone(),
        &PostProcessContext::new(&glioma, "clinical_study_designation", "ICDC-Glioma"),
    );
    assert_eq!(corrected["Aggregate_ImageCount"], json!(100));
    assert_eq!(corrected["Aggregate_Modality"], json!(["Histopathology", "MR"]));

    let other = entity("GLIOMA02");
    let plain = processor.apply(
        series,
        &PostProcessContext::new(&other, "clinical_study_designation", "ICDC-Glioma"),
    );
    assert_eq!(plain["Aggregate_ImageCount"], json!(16));
    assert_eq!(plain["Aggregate_Modality"], json!(["MR"]));
}

#[test]
fn test_merge_additive_nested() {
    let mut base = json!({"stats": {"count": 2, "tags": ["b", "a"]}, "name": "x"})
        .as_object()
        .cloned()
        .unwrap();
    let overlay = json!({"stats": {"count": 3, "tags": ["c", "a"]}, "name": "y", "new": true})
        .as_object()
        .cloned()
        .unwrap();

    merge_additive(&mut base, overlay);

    assert_eq!(
        Value::Object(base),
        json!({"stats": {"count": 5, "tags": ["a", "b", "c"]}, "name": "y", "new": true})
    );
}

#[test]
fn test_unknown_post_processor_is_ignored() {
    let registry = PostProcessorRegistry::builtin();
    assert!(registry.resolve(Some("summarize_everything")).is_none());
}
