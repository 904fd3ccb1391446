use crate::types::Record;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Copy of `value` with every object's keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical text of a record's full content, independent of key order.
///
/// Tag fields added before merging are part of the content, so the same API
/// record tagged with two different identifiers yields two different keys.
pub fn dedup_key(record: &Record) -> String {
    canonicalize(&Value::Object(record.clone())).to_string()
}

/// Drops records whose content equals an earlier one, keeping first-seen order.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(dedup_key(record)))
        .collect()
}
