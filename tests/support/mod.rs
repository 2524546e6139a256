//! Shared fixtures and assertions for the integration tests.
#![allow(dead_code)]

use rowgraph::{Record, Value};

pub fn rec(json: serde_json::Value) -> Record {
    Record::try_from(json).expect("fixture must be a JSON object")
}

pub fn recs(json: serde_json::Value) -> Vec<Record> {
    match json {
        serde_json::Value::Array(items) => items.into_iter().map(rec).collect(),
        other => panic!("fixture must be a JSON array, got {other}"),
    }
}

pub fn get_i64(record: &Record, field: &str) -> i64 {
    record
        .get(field)
        .and_then(Value::as_i64)
        .unwrap_or_else(|| panic!("field '{field}' missing or not an integer in {record:?}"))
}

pub fn get_f64(record: &Record, field: &str) -> f64 {
    record
        .get(field)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("field '{field}' missing or not numeric in {record:?}"))
}

pub fn get_str<'a>(record: &'a Record, field: &str) -> &'a str {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("field '{field}' missing or not a string in {record:?}"))
}

/// Relative-tolerance float comparison, in the spirit of pytest.approx.
pub fn assert_approx(actual: f64, expected: f64, rel: f64) {
    let tolerance = rel * expected.abs().max(f64::EPSILON);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}
