mod common;

use common::rec;
use kcdb_export::{collect_columns, write_batch, write_records, Record};
use serde_json::json;
use std::fs;

fn render(records: &[Record]) -> (usize, String) {
    let mut out = Vec::new();
    let rows = write_records(&mut out, records).unwrap();
    (rows, String::from_utf8(out).unwrap())
}

#[test]
fn empty_batch_writes_nothing() {
    let (rows, text) = render(&[]);
    assert_eq!(rows, 0);
    assert!(text.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("empty.csv");
    assert_eq!(write_batch(&path, &[]).unwrap(), 0);
    assert!(!path.exists());
}

#[test]
fn disjoint_fields_are_padded() {
    let records = vec![rec(json!({ "a": 1 })), rec(json!({ "b": 2 }))];

    let (rows, text) = render(&records);

    assert_eq!(rows, 2);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["a,b", "1,", ",2"]);
}

#[test]
fn columns_are_union_in_first_seen_order() {
    let records = vec![
        rec(json!({ "id": 1, "label": "x" })),
        rec(json!({ "label": "y", "value": "v", "id": 2 })),
        rec(json!({ "extra": true })),
    ];

    assert_eq!(collect_columns(&records), vec!["id", "label", "value", "extra"]);
}

#[test]
fn delimiters_and_quotes_are_escaped() {
    let records = vec![rec(json!({
        "name": "Mass, force",
        "note": "said \"hi\"",
        "nested": { "x": 2 }
    }))];

    let (_, text) = render(&records);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "name,note,nested");
    assert_eq!(lines[1], r#""Mass, force","said ""hi""","{""x"": 2}""#);
}

#[test]
fn write_batch_creates_directory_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("branch.csv");

    let first = vec![rec(json!({ "id": 1 })), rec(json!({ "id": 2 }))];
    assert_eq!(write_batch(&path, &first).unwrap(), 2);

    let second = vec![rec(json!({ "code": "EM" }))];
    assert_eq!(write_batch(&path, &second).unwrap(), 1);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["code", "EM"]);

    // no temporary files left behind
    let entries = fs::read_dir(dir.path().join("out")).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn unwritable_target_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "file").unwrap();

    let result = write_batch(&blocker.join("x.csv"), &[rec(json!({ "a": 1 }))]);

    assert!(result.is_err());
}

#[cfg(unix)]
#[test]
fn rewritten_file_keeps_existing_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let records = vec![rec(json!({ "id": 1 }))];

    for mode in [0o644, 0o640] {
        let path = dir.path().join(format!("mode_{:o}.csv", mode));
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();

        write_batch(&path, &records).unwrap();

        let actual = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(actual, mode);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["id", "1"]);
    }
}
