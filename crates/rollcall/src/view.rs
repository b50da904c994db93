//! Read-side views built on top of the store.
//!
//! Single-date views are one partition plus its stats. All-dates views list
//! every record, newest date first, with the per-date stats summed.

use serde::Serialize;

use crate::error::Result;
use crate::record::{AttendanceRecord, AttendanceStats};
use crate::store::{AttendanceDocument, AttendanceStore};

/// A record together with the date partition it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedRecord {
    /// Date key of the partition.
    pub date: String,
    /// The record itself.
    #[serde(flatten)]
    pub record: AttendanceRecord,
}

/// Records and statistics for one date or for all dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceView {
    /// The date shown, or `None` for all dates.
    pub date: Option<String>,
    /// Records in display order.
    pub records: Vec<DatedRecord>,
    /// Statistics over `records`.
    pub stats: AttendanceStats,
}

impl AttendanceView {
    /// View of a single date.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn for_date(store: &AttendanceStore, date: &str) -> Result<Self> {
        let records = store.load_date(date)?;
        let stats = AttendanceStore::stats(&records);
        Ok(Self {
            date: Some(date.to_string()),
            records: records
                .into_iter()
                .map(|record| DatedRecord {
                    date: date.to_string(),
                    record,
                })
                .collect(),
            stats,
        })
    }

    /// View of every date in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn all_dates(store: &AttendanceStore) -> Result<Self> {
        Ok(Self::from_document(store.load()?))
    }

    /// Build an all-dates view from an already loaded document.
    #[must_use]
    pub fn from_document(document: AttendanceDocument) -> Self {
        let mut stats = AttendanceStats::default();
        let mut records = Vec::new();

        for (date, partition) in document.into_iter().rev() {
            stats += AttendanceStore::stats(&partition);
            records.extend(partition.into_iter().map(|record| DatedRecord {
                date: date.clone(),
                record,
            }));
        }

        Self {
            date: None,
            records,
            stats,
        }
    }

    /// Check if the view holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
