//! Core attendance types for rollcall.
//!
//! This module defines the records stored per date, the meal selection they
//! carry, and the statistics derived from them.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format of date keys in the attendance document.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of record timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a date as a document key (`YYYY-MM-DD`).
#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a caller-supplied date key.
///
/// Only the canonical zero-padded form is accepted, so that keys sort
/// correctly as plain strings.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not a valid `YYYY-MM-DD` date.
pub fn parse_date_key(value: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate {
        value: value.to_string(),
    };
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())?;
    if date_key(date) == value {
        Ok(date)
    } else {
        Err(invalid())
    }
}

/// Whether a student is coming on the day of the record.
///
/// Anything other than the two known values is kept verbatim in
/// [`AttendanceStatus::Other`]; such records count toward the total only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendanceStatus {
    /// The student will attend.
    Coming,
    /// The student will not attend.
    NotComing,
    /// Any other status text.
    Other(String),
}

impl AttendanceStatus {
    /// Stored text of the `Coming` status.
    pub const COMING: &'static str = "Coming";
    /// Stored text of the `Not Coming` status.
    pub const NOT_COMING: &'static str = "Not Coming";

    /// The text persisted for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Coming => Self::COMING,
            Self::NotComing => Self::NOT_COMING,
            Self::Other(text) => text,
        }
    }

    /// Check if this is the `Coming` status.
    #[must_use]
    pub fn is_coming(&self) -> bool {
        matches!(self, Self::Coming)
    }
}

impl From<String> for AttendanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::COMING => Self::Coming,
            Self::NOT_COMING => Self::NotComing,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for AttendanceStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<AttendanceStatus> for String {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Other(text) => text,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meal selection of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Meals {
    /// Breakfast requested.
    pub breakfast: bool,
    /// Lunch requested.
    pub lunch: bool,
    /// Dinner requested.
    pub dinner: bool,
}

impl Meals {
    /// Create a meal selection.
    #[must_use]
    pub fn new(breakfast: bool, lunch: bool, dinner: bool) -> Self {
        Self {
            breakfast,
            lunch,
            dinner,
        }
    }
}

/// One student's attendance and meal selection for one date.
///
/// `id` is unique within its date partition only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Position of the record within its date, starting at 1.
    pub id: u32,
    /// Name as submitted (trimmed by the front end).
    pub student_name: String,
    /// Attendance status.
    pub status: AttendanceStatus,
    /// Requested meals.
    #[serde(default)]
    pub meals: Meals,
    /// Creation time in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
}

impl AttendanceRecord {
    /// Create a record stamped with the given local time.
    #[must_use]
    pub fn new(
        id: u32,
        student_name: impl Into<String>,
        status: AttendanceStatus,
        meals: Meals,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            student_name: student_name.into(),
            status,
            meals,
            timestamp: created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Parse the stored timestamp, if it is well formed.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

/// Aggregate counts over a set of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Number of records.
    pub total: usize,
    /// Records with status `Coming`.
    pub coming: usize,
    /// Records with status `Not Coming`.
    pub not_coming: usize,
    /// `Coming` records that requested breakfast.
    pub breakfast: usize,
    /// `Coming` records that requested lunch.
    pub lunch: usize,
    /// `Coming` records that requested dinner.
    pub dinner: usize,
}

impl AttendanceStats {
    /// Aggregate the given records. Pure; performs no I/O.
    #[must_use]
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status {
                AttendanceStatus::Coming => {
                    stats.coming += 1;
                    stats.breakfast += usize::from(record.meals.breakfast);
                    stats.lunch += usize::from(record.meals.lunch);
                    stats.dinner += usize::from(record.meals.dinner);
                }
                AttendanceStatus::NotComing => stats.not_coming += 1,
                AttendanceStatus::Other(_) => {}
            }
            stats
        })
    }
}

impl Add for AttendanceStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for AttendanceStats {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.coming += rhs.coming;
        self.not_coming += rhs.not_coming;
        self.breakfast += rhs.breakfast;
        self.lunch += rhs.lunch;
        self.dinner += rhs.dinner;
    }
}

impl Sum for AttendanceStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str, breakfast: bool, lunch: bool, dinner: bool) -> AttendanceRecord {
        let at = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        AttendanceRecord::new(
            1,
            "Student",
            AttendanceStatus::from(status),
            Meals::new(breakfast, lunch, dinner),
            at,
        )
    }

    #[test]
    fn test_status_from_known_text() {
        assert_eq!(AttendanceStatus::from("Coming"), AttendanceStatus::Coming);
        assert_eq!(
            AttendanceStatus::from("Not Coming"),
            AttendanceStatus::NotComing
        );
    }

    #[test]
    fn test_status_keeps_unknown_text() {
        let status = AttendanceStatus::from("Maybe");
        assert_eq!(status, AttendanceStatus::Other("Maybe".to_string()));
        assert_eq!(status.to_string(), "Maybe");
        assert!(!status.is_coming());
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let json = serde_json::to_string(&AttendanceStatus::NotComing).unwrap();
        assert_eq!(json, "\"Not Coming\"");

        let parsed: AttendanceStatus = serde_json::from_str("\"coming\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::Other("coming".to_string()));
    }

    #[test]
    fn test_record_json_shape() {
        let rec = record("Coming", true, false, true);
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "student_name": "Student",
                "status": "Coming",
                "meals": {"breakfast": true, "lunch": false, "dinner": true},
                "timestamp": "2024-03-15 08:30:00"
            })
        );
    }

    #[test]
    fn test_record_without_meals_defaults_to_none() {
        let rec: AttendanceRecord = serde_json::from_str(
            r#"{"id": 2, "student_name": "A", "status": "Coming", "timestamp": "2024-01-01 00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(rec.meals, Meals::default());
    }

    #[test]
    fn test_created_at_roundtrip() {
        let rec = record("Coming", false, false, false);
        let at = rec.created_at().unwrap();
        assert_eq!(at.format(TIMESTAMP_FORMAT).to_string(), rec.timestamp);
    }

    #[test]
    fn test_stats_literal_input() {
        let records = vec![
            record("Coming", true, false, true),
            record("Not Coming", true, true, true),
            record("Coming", false, false, false),
        ];
        let stats = AttendanceStats::from_records(&records);
        assert_eq!(
            stats,
            AttendanceStats {
                total: 3,
                coming: 2,
                not_coming: 1,
                breakfast: 1,
                lunch: 0,
                dinner: 1,
            }
        );
    }

    #[test]
    fn test_stats_other_status_counts_toward_total_only() {
        let records = vec![record("Late", true, true, true)];
        let stats = AttendanceStats::from_records(&records);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.coming + stats.not_coming, 0);
        assert_eq!(stats.breakfast + stats.lunch + stats.dinner, 0);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(AttendanceStats::from_records(&[]), AttendanceStats::default());
    }

    #[test]
    fn test_stats_sum() {
        let day1 = AttendanceStats::from_records(&[record("Coming", true, true, false)]);
        let day2 = AttendanceStats::from_records(&[
            record("Coming", true, false, false),
            record("Not Coming", false, false, false),
        ]);
        let total: AttendanceStats = [day1, day2].into_iter().sum();
        assert_eq!(total.total, 3);
        assert_eq!(total.coming, 2);
        assert_eq!(total.not_coming, 1);
        assert_eq!(total.breakfast, 2);
        assert_eq!(total.lunch, 1);
        assert_eq!(total.dinner, 0);
        assert_eq!(day1 + day2, total);
    }

    #[test]
    fn test_parse_date_key() {
        let date = parse_date_key("2024-03-15").unwrap();
        assert_eq!(date_key(date), "2024-03-15");
    }

    #[test]
    fn test_parse_date_key_rejects_other_forms() {
        for bad in ["15/03/2024", "2024-3-15", "2024-02-30", "", "today"] {
            let err = parse_date_key(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidDate { .. }), "accepted {bad}");
        }
    }
}
