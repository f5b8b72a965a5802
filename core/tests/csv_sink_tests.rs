use csv_sink_core::*;

use std::path::Path;

fn open_sink(path: &Path, columns: &str, separator: &str) -> CsvSink {
    let config = SinkConfig::from_args([
        format!("filename='{}'", path.display()),
        format!("columns='{columns}'"),
        format!("separator='{separator}'"),
    ])
    .unwrap();
    <CsvSink>::open(config).unwrap()
}

fn read_records(path: &Path, separator: u8) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(separator)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn test_file_output_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");

    let mut sink = open_sink(&path, "id,name", ",");
    sink.insert_row([Some("1"), Some("O'Brien, Jr.")]).unwrap();
    sink.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, b"id,name\r\n1,\"O'Brien, Jr.\"\r\n");
}

#[test]
fn test_null_trailing_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nulls.csv");

    let mut sink = open_sink(&path, "a,b", ";");
    sink.insert_row([Some("value1"), None]).unwrap();
    drop(sink);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, b"a;b\r\nvalue1;\r\n");
}

#[test]
fn test_open_truncates_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("existing.csv");
    std::fs::write(&path, "stale contents that must disappear\r\n").unwrap();

    drop(open_sink(&path, "x", ","));

    assert_eq!(std::fs::read(&path).unwrap(), b"x\r\n");
}

#[test]
fn test_open_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("out.csv");
    let config = SinkConfig::from_args([
        format!("filename={}", path.display()),
        "columns=a".to_string(),
        "separator=,".to_string(),
    ])
    .unwrap();

    let err = <CsvSink>::open(config).err().unwrap();
    assert!(matches!(err, SinkError::SinkOpen { .. }));
    assert!(err.is_fatal_to_construction());
    assert!(!path.exists());
}

#[test]
fn test_empty_column_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    let sink = open_sink(&path, ",b", ",");
    assert_eq!(sink.columns().names(), ["", "b"]);
    assert_eq!(
        sink.schema_declaration(),
        r#"CREATE TABLE x("" TEXT, "b" TEXT)"#
    );
    drop(sink);

    assert_eq!(std::fs::read(&path).unwrap(), b",b\r\n");
}

#[test]
fn test_quoted_values_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tricky.csv");
    let values = [
        "plain",
        "with,comma",
        "say \"hi\"",
        "multi\r\nline",
        "naïve café",
        "tab\tseparated",
        "",
        "O'Brien",
    ];

    let mut sink = open_sink(&path, "value,pipe|name", ",");
    for value in values {
        sink.insert_row([Some(value), Some("a|b")]).unwrap();
    }
    sink.close().unwrap();

    let records = read_records(&path, b',');
    assert_eq!(records[0], ["value", "pipe|name"]);
    let read: Vec<&str> = records[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(read, values);
    assert!(records[1..].iter().all(|r| r[1] == "a|b"));
}

#[test]
fn test_custom_separator_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipes.csv");

    let mut sink = open_sink(&path, "left,right", "|");
    sink.insert_row([Some("a|b"), Some("c,d")]).unwrap();
    sink.close().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, b"left|right\r\n\"a|b\"|c,d\r\n");

    let records = read_records(&path, b'|');
    assert_eq!(records[1], ["a|b", "c,d"]);
}

#[test]
fn test_missing_separator_prevents_open() {
    let err = SinkConfig::from_args(["filename=out.csv", "columns=a,b"]).unwrap_err();
    assert!(matches!(
        err,
        SinkError::Config(ConfigError::MissingField { ref field }) if field == "separator"
    ));
}
