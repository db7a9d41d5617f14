//! Payload extraction from nested responses

use serde_json::{Map, Value};

/// Walk a dotted key path (`data.studiesByProgram`) into a response
///
/// Returns the input unchanged when no path is configured. A missing key or
/// a non-object node along the way yields an empty object; this never fails.
pub fn extract_response_data(path: Option<&str>, response: Value) -> Value {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return response;
    };

    let mut current = response;
    for part in path.split('.') {
        current = match current {
            Value::Object(mut map) => map.remove(part).unwrap_or_else(empty_object),
            _ => return empty_object(),
        };
    }
    current
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
