//! Sink output format tests

mod support;

use std::fs;

use snapload_core::types::{RowSet, Scalar};
use snapload_io::{FileSink, SinkWriter};
use support::TempDir;

fn sample() -> RowSet {
    RowSet::with_rows(
        vec!["id".into(), "name".into(), "score".into(), "active".into()],
        vec![
            vec![Scalar::I64(1), Scalar::from("Ada"), Scalar::F64(9.5), Scalar::Bool(true)],
            vec![Scalar::I64(2), Scalar::from("Grace \"Amazing\""), Scalar::Null, Scalar::Bool(false)],
        ],
    )
    .unwrap()
}

#[test]
fn test_csv_sink_writes_header_and_quotes() {
    let dir = TempDir::new("sink-csv");
    let sink = FileSink::new(Some(dir.path().to_string_lossy().into_owned()));
    assert_eq!(sink.write_table("people.csv", &sample()).unwrap(), 2);

    let text = fs::read_to_string(dir.join("people.csv")).unwrap();
    assert_eq!(
        text,
        "id,name,score,active\n1,Ada,9.5,true\n2,\"Grace \"\"Amazing\"\"\",,false\n"
    );
}

#[test]
fn test_jsonl_sink_one_object_per_row() {
    let dir = TempDir::new("sink-jsonl");
    let sink = FileSink::new(Some(dir.path().to_string_lossy().into_owned()));
    sink.write_table("people.jsonl", &sample()).unwrap();

    let text = fs::read_to_string(dir.join("people.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["name"], "Ada");
    assert_eq!(lines[1]["score"], serde_json::Value::Null);
    assert_eq!(lines[1]["active"], false);
}

#[test]
fn test_absolute_sink_ignores_output_dir() {
    let dir = TempDir::new("sink-abs");
    let target = dir.join("abs/people.csv");
    let sink = FileSink::new(Some("ignored-dir".into()));
    sink.write_table(&target.to_string_lossy(), &sample()).unwrap();
    assert!(target.is_file());
    assert!(!std::path::Path::new("ignored-dir").exists());
}

#[test]
fn test_rewrites_are_deterministic() {
    let dir = TempDir::new("sink-det");
    let sink = FileSink::new(Some(dir.path().to_string_lossy().into_owned()));
    sink.write_table("a.csv", &sample()).unwrap();
    let first = fs::read(dir.join("a.csv")).unwrap();
    sink.write_table("a.csv", &sample()).unwrap();
    assert_eq!(first, fs::read(dir.join("a.csv")).unwrap());
}
