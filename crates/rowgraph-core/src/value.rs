//! Dynamically typed scalar values carried by records.
//!
//! `List` and `Map` are opaque payloads: the engine carries them through
//! untouched for user callbacks but refuses to order or index by them.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// Tag of a `Value`, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Order two values within a tag class.
///
/// Integers and floats compare numerically (mixing coerces to float, NaN
/// sorts greatest and equals itself); strings by code point; `false < true`;
/// null equals null and is comparable with nothing else. Every other pairing
/// is a `TypeMismatch`.
pub fn cmp_values(a: &Value, b: &Value) -> Result<Ordering> {
    use Value::*;
    match (a, b) {
        (Null, Null) => Ok(Ordering::Equal),
        (Bool(x), Bool(y)) => Ok(x.cmp(y)),
        (Int(x), Int(y)) => Ok(x.cmp(y)),
        (Str(x), Str(y)) => Ok(x.cmp(y)),
        (Int(_) | Float(_), Int(_) | Float(_)) => {
            // as_f64 is total on numeric tags
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            Ok(cmp_f64(x, y))
        }
        _ => Err(Error::TypeMismatch(format!(
            "cannot compare {} with {}",
            a.kind(),
            b.kind()
        ))),
    }
}

fn cmp_f64(x: f64, y: f64) -> Ordering {
    if x.is_nan() && y.is_nan() {
        Ordering::Equal
    } else if x.is_nan() {
        Ordering::Greater
    } else if y.is_nan() {
        Ordering::Less
    } else {
        x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_tags_coerce() {
        assert_eq!(
            cmp_values(&Value::Int(2), &Value::Float(2.5)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            cmp_values(&Value::Float(2.0), &Value::Int(2)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn cross_tag_comparison_is_an_error() {
        let err = cmp_values(&Value::Int(1), &Value::Str("1".into())).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));

        let err = cmp_values(&Value::Null, &Value::Int(0)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn nan_sorts_greatest_and_equals_itself() {
        assert_eq!(
            cmp_values(&Value::Float(f64::NAN), &Value::Float(1e300)).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            cmp_values(&Value::Float(f64::NAN), &Value::Float(f64::NAN)).unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn equality_is_structural() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::from("a"), Value::Str("a".to_string()));
    }

    #[test]
    fn json_round_trip_keeps_tags() {
        let v = Value::from(serde_json::json!({"n": 1, "f": 1.5, "s": "x", "l": [1, null]}));
        match &v {
            Value::Map(fields) => {
                assert_eq!(fields["n"], Value::Int(1));
                assert_eq!(fields["f"], Value::Float(1.5));
                assert_eq!(fields["l"], Value::List(vec![Value::Int(1), Value::Null]));
            }
            other => panic!("expected map, got {other:?}"),
        }
        let back = serde_json::Value::from(&v);
        assert_eq!(back["s"], serde_json::json!("x"));
    }
}
