//! Firestore typed values.
//!
//! The REST API wraps every field in a one-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "3"}`, ...). [`Fields`] reads the
//! handful of shapes unit and booking documents use.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// A Firestore document as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Document {
    /// Full resource name; the document id is the last path segment.
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum Value {
    NullValue(serde_json::Value),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ReferenceValue(String),
    MapValue(MapValue),
    ArrayValue(serde_json::Value),
    BytesValue(String),
    GeoPointValue(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    /// Renders scalar values as text; `None` for null, maps and arrays.
    fn as_text(&self) -> Option<String> {
        match self {
            Self::StringValue(s) | Self::TimestampValue(s) | Self::IntegerValue(s) => Some(s.clone()),
            Self::ReferenceValue(s) => s.rsplit('/').next().map(str::to_string),
            Self::DoubleValue(d) => Some(d.to_string()),
            Self::BooleanValue(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// The fields of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Fields(pub BTreeMap<String, Value>);

impl Fields {
    /// A non-blank text value.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .and_then(Value::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// A calendar date.
    ///
    /// Accepts `YYYY-MM-DD` strings, RFC 3339 strings and timestamps (the date
    /// as written in the value's own offset).
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        let text = self.text(key)?;
        NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(&text).ok().map(|dt| dt.date_naive()))
    }
}
