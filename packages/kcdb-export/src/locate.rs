//! Finding the record list inside an arbitrarily shaped response body.
//!
//! The search is depth-first and the first match wins: sequence elements are
//! visited in order and mapping values in document order. When a body carries
//! several plausible lists, the earliest one in that order is the one exported.

use crate::types::Record;
use serde_json::Value;

/// Returns the first non-empty sequence whose elements are all objects.
pub fn find_record_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(Value::is_object) {
                return Some(items);
            }
            items.iter().find_map(find_record_list)
        }
        Value::Object(map) => map.values().find_map(find_record_list),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    }
}

/// Owned copy of the first record list, or empty when there is none.
pub fn locate_records(value: &Value) -> Vec<Record> {
    find_record_list(value)
        .map(|items| objects(items))
        .unwrap_or_default()
}

/// Looks under `list_key` first, then falls back to searching the whole body.
///
/// A sequence stored under the key is taken as-is (non-object elements are
/// dropped); any other value under the key is searched.
pub fn extract_records(body: &Value, list_key: Option<&str>) -> Vec<Record> {
    if let Some(key) = list_key {
        if let Some(inner) = body.get(key) {
            let records = match inner {
                Value::Array(items) => objects(items),
                other => locate_records(other),
            };
            if !records.is_empty() {
                return records;
            }
        }
    }

    locate_records(body)
}

fn objects(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .filter_map(Value::as_object)
        .cloned()
        .collect()
}
