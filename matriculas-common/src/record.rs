//! Schema-less dataset records
//!
//! Remote datasets carry whatever columns their source sheet has, so a
//! record is a plain field-name → scalar map. Absent and falsy values both
//! read as empty text through [`Record::text`].

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

/// Value held in a record field
///
/// Sheets export scalars; an occasional nested array or object lands in
/// [`FieldValue::Json`] instead of failing the whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    Bool(bool),
    Null,
    Json(serde_json::Value),
}

impl FieldValue {
    /// Falsy values are `""`, `0`, `false` and `null`
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Number(n) => n.as_f64().map(|v| v != 0.0 && !v.is_nan()).unwrap_or(true),
            FieldValue::Bool(b) => *b,
            FieldValue::Null => false,
            FieldValue::Json(_) => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => {
                // Whole floats print without a trailing ".0" so "320.0" and "320" agree
                match n.as_f64() {
                    Some(v) if !n.is_i64() && !n.is_u64() && v.fract() == 0.0 && v.abs() < 1e15 => {
                        write!(f, "{}", v as i64)
                    }
                    _ => write!(f, "{}", n),
                }
            }
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
            FieldValue::Json(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v.into())
    }
}

/// One row of a dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Text form of a field, `""` when absent or falsy
    pub fn text(&self, field: &str) -> String {
        match self.0.get(field) {
            Some(value) if value.is_truthy() => value.to_string(),
            _ => String::new(),
        }
    }

    /// True when the field is present and truthy
    pub fn has(&self, field: &str) -> bool {
        self.0.get(field).map(FieldValue::is_truthy).unwrap_or(false)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Remote payload and cache document: `{ "data": [ ... ] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub data: Vec<Record>,
}

impl Dataset {
    pub fn new(data: Vec<Record>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column names taken from the first record
    pub fn columns(&self) -> Vec<String> {
        self.data
            .first()
            .map(|r| r.fields().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
