use crate::types::{FlatRow, Record};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use std::io;

/// JSON formatter that puts a space after `,` and `:` on a single line,
/// e.g. `{"x": 2, "y": [1, 2]}`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn to_spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        // Unreachable for in-memory values; keep the compact form rather than lose the cell
        Err(_) => value.to_string(),
    }
}

/// Text form of one cell.
///
/// Null becomes empty text, strings are written verbatim, numbers and booleans
/// use their JSON literal, nested objects and arrays are embedded as JSON text
/// (non-ASCII left unescaped).
///
/// Booleans are `true`/`false` as in the response body, not the capitalised
/// `True`/`False` of the older export scripts. Numbers keep every digit of the
/// body, including integers beyond 64 bits.
pub fn flatten_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => to_spaced_json(value),
    }
}

/// Projects a record onto `columns`, padding absent fields with empty text.
pub fn flatten_record(record: &Record, columns: &[String]) -> FlatRow {
    columns
        .iter()
        .map(|column| {
            let cell = record.get(column).map(flatten_value).unwrap_or_default();
            (column.clone(), cell)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_values_keep_document_order() {
        let v = json!({ "b": 1, "a": [true, null] });
        assert_eq!(flatten_value(&v), r#"{"b": 1, "a": [true, null]}"#);
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let v = json!({ "name": "Ångström" });
        assert_eq!(flatten_value(&v), r#"{"name": "Ångström"}"#);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(flatten_value(&json!([])), "[]");
        assert_eq!(flatten_value(&json!({})), "{}");
    }
}
