//! Paper records
//!
//! A `PaperRecord` is the typed shape every source adapter returns and the
//! store persists. Authors and metadata are serialized as JSON text in
//! storage and deserialized to structured form on read. Source payload
//! fields outside the core schema are folded into the open `metadata` map.

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Core paper fields recognized by [`PaperRecord::from_value`]; everything
/// else in a source payload lands in `metadata`.
const CORE_FIELDS: &[&str] = &[
    "paper_key",
    "title",
    "authors",
    "year",
    "source",
    "abstract",
    "citation_count",
    "url",
];

/// A research paper as fetched from a source or read back from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Store rowid, present once the record has been persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// External paper key, derived from source + title when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_key: Option<String>,

    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub year: i64,

    #[serde(default)]
    pub source: String,

    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    #[serde(default)]
    pub citation_count: i64,

    #[serde(default)]
    pub url: String,

    /// Open map for source-specific fields
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl PaperRecord {
    /// Deterministic external key: source plus the first 50 characters of
    /// the title.
    pub fn derived_key(&self) -> String {
        let title: String = self.title.chars().take(50).collect();
        format!("{}_{}", self.source, title)
    }

    /// The key the store will deduplicate on.
    pub fn storage_key(&self) -> String {
        self.paper_key.clone().unwrap_or_else(|| self.derived_key())
    }

    /// Build a record from a loose JSON payload, folding unrecognized fields
    /// into the metadata map.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(AppError::internal("paper payload is not an object"));
        };

        let title = match fields.remove("title") {
            Some(Value::String(title)) => title,
            _ => return Err(AppError::internal("paper payload missing title")),
        };

        let authors = match fields.remove("authors") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        let year = fields
            .remove("year")
            .and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .unwrap_or(0);

        let take_string = |fields: &mut Map<String, Value>, key: &str| {
            fields
                .remove(key)
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default()
        };

        let source = take_string(&mut fields, "source");
        let abstract_text = take_string(&mut fields, "abstract");
        let url = take_string(&mut fields, "url");
        let citation_count = fields
            .remove("citation_count")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let paper_key = fields
            .remove("paper_key")
            .and_then(|v| v.as_str().map(str::to_string));

        debug_assert!(CORE_FIELDS.iter().all(|f| !fields.contains_key(*f)));

        Ok(PaperRecord {
            id: None,
            paper_key,
            title,
            authors,
            year,
            source,
            abstract_text,
            citation_count,
            url,
            metadata: fields,
        })
    }
}

/// A paper in a user's saved collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPaper {
    pub paper: PaperRecord,
    pub date_saved: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Raw row shape for the papers table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PaperRow {
    pub id: i64,
    pub paper_key: String,
    pub title: String,
    pub authors: String,
    pub year: i64,
    pub source: String,
    pub abstract_text: String,
    pub citation_count: i64,
    pub url: String,
    pub metadata: String,
}

impl TryFrom<PaperRow> for PaperRecord {
    type Error = AppError;

    fn try_from(row: PaperRow) -> Result<Self> {
        Ok(PaperRecord {
            id: Some(row.id),
            paper_key: Some(row.paper_key),
            title: row.title,
            authors: serde_json::from_str(&row.authors)?,
            year: row.year,
            source: row.source,
            abstract_text: row.abstract_text,
            citation_count: row.citation_count,
            url: row.url,
            metadata: serde_json::from_str(&row.metadata)?,
        })
    }
}
