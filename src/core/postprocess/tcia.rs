//! `aggregate_tcia_series_data`: collapse TCIA series into one summary record

use super::merge::merge_additive;
use super::{PostProcessContext, PostProcessor};
use crate::domain::match_value;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

/// Summarizes a group of per-series records
///
/// Produces `Collection`, the number of distinct patients, the sorted
/// distinct modalities and body parts, and the total image count.
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregateTciaSeries;

impl PostProcessor for AggregateTciaSeries {
    fn name(&self) -> &'static str {
        "aggregate_tcia_series_data"
    }

    fn apply(&self, metadata: Value, context: &PostProcessContext<'_>) -> Value {
        let series: Vec<Value> = match metadata {
            Value::Array(items) => items,
            Value::Object(record) => vec![Value::Object(record)],
            _ => Vec::new(),
        };

        let mut patients = BTreeSet::new();
        let mut modalities = BTreeSet::new();
        let mut body_parts = BTreeSet::new();
        let mut images: u64 = 0;

        for item in &series {
            if let Some(patient) = item.get("PatientID").and_then(match_value) {
                patients.insert(patient);
            }
            if let Some(modality) = item.get("Modality").and_then(match_value) {
                modalities.insert(modality);
            }
            if let Some(part) = item.get("BodyPartExamined").and_then(match_value) {
                body_parts.insert(part);
            }
            images = images.saturating_add(image_count(item.get("ImageCount")));
        }

        let mut aggregate = Map::new();
        aggregate.insert("Collection".to_string(), json!(context.collection_id));
        aggregate.insert("Aggregate_PatientID".to_string(), json!(patients.len()));
        aggregate.insert("Aggregate_Modality".to_string(), json!(modalities));
        aggregate.insert("Aggregate_BodyPartExamined".to_string(), json!(body_parts));
        aggregate.insert("Aggregate_ImageCount".to_string(), json!(images));

        if let Some(correction) = known_gap_correction(context) {
            merge_additive(&mut aggregate, correction);
            tracing::info!(
                collection = %context.collection_id,
                "Added hardcoded TCIA totals for GLIOMA01"
            );
        }

        tracing::info!(
            collection = %context.collection_id,
            patients = patients.len(),
            images = aggregate["Aggregate_ImageCount"].as_u64().unwrap_or(images),
            "Completed aggregation of TCIA series data"
        );

        Value::Object(aggregate)
    }
}

/// Entity whose histopathology series TCIA does not expose through its API
const GLIOMA01_ENTITY_ID: &str = "GLIOMA01";

/// Hardcoded totals for GLIOMA01.
///
/// Temporary compensation for a known upstream gap: the histopathology
/// images of this study are published but not returned by the series
/// endpoint. Applies to this one entity only; drop it once TCIA serves the
/// series.
fn known_gap_correction(context: &PostProcessContext<'_>) -> Option<Map<String, Value>> {
    if context.entity_id().as_deref() != Some(GLIOMA01_ENTITY_ID) {
        return None;
    }

    let mut correction = Map::new();
    correction.insert("Aggregate_Modality".to_string(), json!(["Histopathology"]));
    correction.insert("Aggregate_ImageCount".to_string(), json!(84));
    Some(correction)
}

/// Image count as number or numeric string; anything else counts as zero
fn image_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
