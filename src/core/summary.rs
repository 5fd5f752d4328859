use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryValue {
    /// Section heading row; rendered as an empty value.
    Marker,
    Text(String),
    Count(u64),
    Gigabytes(f64),
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Marker => Ok(()),
            SummaryValue::Text(s) => f.write_str(s),
            SummaryValue::Count(n) => write!(f, "{n}"),
            SummaryValue::Gigabytes(gb) => write!(f, "{gb}"),
        }
    }
}

impl Serialize for SummaryValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SummaryValue::Marker => serializer.serialize_str(""),
            SummaryValue::Text(s) => serializer.serialize_str(s),
            SummaryValue::Count(n) => serializer.serialize_u64(*n),
            SummaryValue::Gigabytes(gb) => serializer.serialize_f64(*gb),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub label: String,
    pub value: SummaryValue,
}

impl Serialize for SummaryEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SummaryEntry", 2)?;
        s.serialize_field("label", &self.label)?;
        s.serialize_field("value", &self.value)?;
        s.end()
    }
}

/// Insertion-ordered label/value pairs. Re-inserting a label overwrites
/// its value in place and keeps the original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryReport {
    entries: Vec<SummaryEntry>,
}

impl SummaryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(self, label: impl Into<String>) -> Self {
        self.with(label, SummaryValue::Marker)
    }

    pub fn with(mut self, label: impl Into<String>, value: SummaryValue) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: SummaryValue) {
        let label = label.into();
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.value = value,
            None => self.entries.push(SummaryEntry { label, value }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&SummaryValue> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.value)
    }

    pub fn entries(&self) -> &[SummaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
