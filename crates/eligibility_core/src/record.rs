//! Applicant records as received from manual entry or a spreadsheet row.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Raw value of a single applicant field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric interpretation. Text is parsed after trimming; blank or
    /// non-numeric text yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Text used when matching against an encoder vocabulary
    pub fn as_category(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One applicant. Fields outside the schema are allowed and ignored by the
/// pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantRecord {
    fields: HashMap<String, FieldValue>,
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a `NAME=VALUE` pair as typed on the command line
    pub fn parse_assignment(raw: &str) -> Option<(String, FieldValue)> {
        let (name, value) = raw.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let parsed = value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .or_else(|_| value.parse::<f64>().map(FieldValue::Number))
            .unwrap_or_else(|_| FieldValue::Text(value.to_string()));
        Some((name.to_string(), parsed))
    }
}

impl FromIterator<(String, FieldValue)> for ApplicantRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, FieldValue)> for ApplicantRecord {
    fn extend<I: IntoIterator<Item = (String, FieldValue)>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}

impl IntoIterator for ApplicantRecord {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}
