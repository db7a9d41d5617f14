//! Additive JSON merge

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Merge `overlay` into `base`, accumulating instead of replacing
///
/// - objects merge key by key, recursively
/// - arrays become the sorted, deduplicated union of both
/// - integers are summed
/// - anything else takes the overlay value
pub fn merge_additive(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, incoming) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, incoming),
            None => {
                base.insert(key, incoming);
            }
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(base), Value::Object(overlay)) => merge_additive(base, overlay),
        (Value::Array(base), Value::Array(overlay)) => {
            let mut union: BTreeMap<String, Value> = BTreeMap::new();
            for item in base.drain(..).chain(overlay) {
                union.entry(sort_key(&item)).or_insert(item);
            }
            base.extend(union.into_values());
        }
        (slot, incoming) => {
            let summed = sum_integers(slot, &incoming);
            *slot = summed.unwrap_or(incoming);
        }
    }
}

fn sum_integers(a: &Value, b: &Value) -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(Value::from(x.saturating_add(y)));
    }
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(Value::from(x.saturating_add(y)));
    }
    None
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
