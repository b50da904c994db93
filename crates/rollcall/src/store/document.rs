//! On-disk representation of the attendance document.
//!
//! The document is a single JSON object mapping `YYYY-MM-DD` date keys to
//! arrays of records. Content that is not a JSON object is classified as a
//! [`Malformation`] and handed to the store's [`RecoveryPolicy`]. Inside an
//! object, a partition or record that does not fit is skipped with a warning;
//! the rest of the document is kept.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::record::AttendanceRecord;

/// The full persisted mapping of date key to partition.
pub type AttendanceDocument = BTreeMap<String, Vec<AttendanceRecord>>;

/// Serialized form of an empty document.
pub const EMPTY_DOCUMENT: &str = "{}";

/// Why persisted content was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformation {
    /// The file exists but holds no content.
    Empty,
    /// The content is not valid UTF-8 JSON.
    Unparseable(String),
    /// The content is JSON, but its root is not an object.
    NotAMapping(&'static str),
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "document is empty"),
            Self::Unparseable(detail) => write!(f, "document is not valid JSON: {detail}"),
            Self::NotAMapping(kind) => write!(f, "document root is {kind}, expected an object"),
        }
    }
}

/// What the store found when it opened the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    /// No document existed; an empty one was written.
    Created,
    /// The document was well formed.
    Valid,
    /// The document was malformed and has been replaced by an empty one.
    Recovered(Malformation),
}

impl DocumentState {
    /// Check if the store had to repair the document.
    #[must_use]
    pub fn was_recovered(&self) -> bool {
        matches!(self, Self::Recovered(_))
    }
}

/// What to do with a malformed document before replacing it.
///
/// Either way the document ends up empty; the policies only differ in
/// whether the rejected bytes are kept around for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Overwrite the malformed content with an empty document.
    #[default]
    Reset,
    /// Move the malformed file aside, then write an empty document.
    Backup,
}

impl fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::Backup => write!(f, "backup"),
        }
    }
}

/// Parse raw file bytes into a document.
///
/// Only the root decides whether the document is malformed. A partition that
/// is not an array, or a record that does not deserialize, is dropped with a
/// warning and every other partition is returned as found.
///
/// # Errors
///
/// Returns the [`Malformation`] describing why the bytes are not a document.
pub fn parse_document(bytes: &[u8]) -> std::result::Result<AttendanceDocument, Malformation> {
    let text = std::str::from_utf8(bytes).map_err(|e| Malformation::Unparseable(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(Malformation::Empty);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| Malformation::Unparseable(e.to_string()))?;
    let partitions = match value {
        Value::Object(partitions) => partitions,
        other => return Err(Malformation::NotAMapping(json_kind(&other))),
    };

    Ok(partitions
        .into_iter()
        .filter_map(|(date, partition)| {
            let records = parse_partition(&date, partition)?;
            Some((date, records))
        })
        .collect())
}

fn parse_partition(date: &str, partition: Value) -> Option<Vec<AttendanceRecord>> {
    let items = match partition {
        Value::Array(items) => items,
        other => {
            warn!(
                "Skipping partition {}: expected an array of records, found {}",
                date,
                json_kind(&other)
            );
            return None;
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping record {} of {}: {}", index, date, e);
                None
            }
        })
        .collect();
    Some(records)
}

/// Serialize a document the way it is stored on disk.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_document(document: &AttendanceDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
