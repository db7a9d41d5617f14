//! Record, dataset and link types
//!
//! External sources answer with arbitrary JSON. Everything that comes back from a
//! fetch is normalized into a [`Dataset`] (a list of [`Group`]s) right at the fetch
//! boundary, so the mapper never has to branch on the shape of the payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single metadata record: one JSON object
pub type Record = Map<String, Value>;

/// An entity record from the entity source
///
/// Opaque apart from the field named by the source's `entity_id_key`.
pub type Entity = Record;

/// A group of metadata records matched as one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(Vec<Record>);

impl Group {
    /// Create a group from records
    pub fn new(records: Vec<Record>) -> Self {
        Self(records)
    }

    /// Records in this group, in source order
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the group has no records
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a group from one payload value
    ///
    /// Arrays keep their object elements; a bare object becomes a
    /// single-record group. Anything else yields an empty group.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(record) => Some(record),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Object(record) => Self(vec![record]),
            _ => Self::default(),
        }
    }

    /// Convert into a JSON array of objects
    pub fn into_value(self) -> Value {
        Value::Array(self.0.into_iter().map(Value::Object).collect())
    }
}

impl From<Vec<Record>> for Group {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

/// All metadata fetched from one source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    groups: Vec<Group>,
}

impl Dataset {
    /// Create a dataset from already-formed groups
    pub fn from_groups(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// Normalize an arbitrary fetched payload into groups
    ///
    /// - array whose first element is an object: a single group
    /// - array of arrays: one group per inner array (bare objects become
    ///   single-record groups)
    /// - bare non-empty object: a single one-record group
    /// - `{}` (an absent response path) and anything else: empty
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                let nested = matches!(items.first(), Some(Value::Array(_)));
                if nested {
                    Self::from_groups(items.into_iter().map(Group::from_value).collect())
                } else if items.is_empty() {
                    Self::default()
                } else {
                    Self::from_groups(vec![Group::from_value(Value::Array(items))])
                }
            }
            Value::Object(record) if !record.is_empty() => {
                Self::from_groups(vec![Group::new(vec![record])])
            }
            _ => Self::default(),
        }
    }

    /// Groups in fetch order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Iterate every record across all groups
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.groups.iter().flat_map(|g| g.records().iter())
    }

    /// Total number of records across all groups
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Whether no group carries any record
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Records of this dataset read as entities
    pub fn entities(&self) -> Vec<Entity> {
        self.records().cloned().collect()
    }
}

/// Read a JSON scalar as a non-empty match string
///
/// Strings are used as-is, numbers and `true` are stringified. `null`,
/// `""`, `false`, arrays and objects count as absent.
pub fn match_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// One external dataset reference attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Source name the dataset came from
    pub repository: String,

    /// Templated dataset URL
    pub url: String,

    /// Group metadata, possibly post-processed
    pub metadata: Value,
}

/// All links found for one entity against one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Value of the entity-id key
    pub entity_id: Value,

    /// Links in group order
    pub links: Vec<LinkRecord>,
}

impl EntityMapping {
    /// Number of links in this mapping
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_list_is_single_group() {
        let dataset = Dataset::from_value(json!([{"a": 1}, {"a": 2}]));
        assert_eq!(dataset.group_count(), 1);
        assert_eq!(dataset.groups()[0].len(), 2);
    }

    #[test]
    fn test_list_of_lists_is_one_group_per_list() {
        let dataset = Dataset::from_value(json!([[{"a": 1}], [{"a": 2}, {"a": 3}], []]));
        assert_eq!(dataset.group_count(), 3);
        assert_eq!(dataset.groups()[1].len(), 2);
        assert!(dataset.groups()[2].is_empty());
        assert_eq!(dataset.record_count(), 3);
    }

    #[test]
    fn test_object_element_inside_nested_list_becomes_group() {
        let dataset = Dataset::from_value(json!([[{"a": 1}], {"b": 2}]));
        assert_eq!(dataset.group_count(), 2);
        assert_eq!(dataset.groups()[1].records()[0]["b"], json!(2));
    }

    #[test]
    fn test_bare_object_and_scalars() {
        assert_eq!(Dataset::from_value(json!({"a": 1})).group_count(), 1);
        assert!(Dataset::from_value(json!([])).is_empty());
        assert!(Dataset::from_value(json!("text")).is_empty());
        assert!(Dataset::from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_empty_object_is_absent() {
        let dataset = Dataset::from_value(json!({}));
        assert_eq!(dataset.group_count(), 0);
        assert!(dataset.entities().is_empty());
    }

    #[test]
    fn test_non_object_items_are_dropped() {
        let group = Group::from_value(json!([{"a": 1}, 3, "x", null]));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_match_value() {
        assert_eq!(match_value(&json!("GLIOMA01")), Some("GLIOMA01".to_string()));
        assert_eq!(match_value(&json!(7)), Some("7".to_string()));
        assert_eq!(match_value(&json!("")), None);
        assert_eq!(match_value(&json!(null)), None);
        assert_eq!(match_value(&json!(false)), None);
        assert_eq!(match_value(&json!(["a"])), None);
    }

    #[test]
    fn test_entity_mapping_serializes_links() {
        let mapping = EntityMapping {
            entity_id: json!("GLIOMA01"),
            links: vec![LinkRecord {
                repository: "IDC".to_string(),
                url: "https://portal/icdc_glioma".to_string(),
                metadata: json!([]),
            }],
        };
        let value = serde_json::to_value(&mapping).unwrap();
        assert_eq!(value["entity_id"], json!("GLIOMA01"));
        assert_eq!(value["links"][0]["repository"], json!("IDC"));
        assert_eq!(mapping.link_count(), 1);
    }
}
