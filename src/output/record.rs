use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record keys owned by the crawler; selector maps may not reuse them
pub const RESERVED_RECORD_KEYS: &[&str] = &["url", "scraped_at"];

/// A single extracted field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Wraps text, treating blank strings as no value
    pub fn text(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self::Text(value))
        }
    }

    /// Wraps a list, treating an empty list as no value
    pub fn list(values: Vec<String>) -> Option<Self> {
        if values.is_empty() {
            None
        } else {
            Some(Self::List(values))
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Structured data pulled from one detail page
///
/// Serialized as a flat JSON object: `url`, `scraped_at`, then one key per
/// field in field-name order, with `null` for fields that matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Option<FieldValue>>,
}

impl ExtractedRecord {
    pub fn new(url: impl Into<String>, fields: BTreeMap<String, Option<FieldValue>>) -> Self {
        Self {
            url: url.into(),
            scraped_at: Utc::now(),
            fields,
        }
    }

    /// A record is worth keeping only if some field matched
    pub fn is_accepted(&self) -> bool {
        self.fields.values().any(Option::is_some)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).and_then(Option::as_ref)
    }

    /// Text of a field, if it holds text
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Title-like label used in logs
    pub fn label(&self) -> &str {
        self.text("title").unwrap_or(&self.url)
    }
}
