//! Export of attendance data as CSV or JSON.
//!
//! Columns follow the record field order: id, student name, status, the three
//! meal flags, timestamp. All-dates exports add a leading `Date` column.

use crate::error::Result;
use crate::record::{AttendanceRecord, Meals};
use crate::store::AttendanceStore;
use crate::view::AttendanceView;

const RECORD_COLUMNS: [&str; 7] = [
    "ID",
    "Student Name",
    "Status",
    "Breakfast",
    "Lunch",
    "Dinner",
    "Timestamp",
];

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// Pretty-printed JSON of the raw records.
    Json,
}

impl ExportFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Render the records of one date, or of every date when `date` is `None`.
///
/// # Errors
///
/// Returns an error if the store cannot be read or serialization fails.
pub fn export(store: &AttendanceStore, date: Option<&str>, format: ExportFormat) -> Result<String> {
    match (date, format) {
        (Some(date), ExportFormat::Csv) => Ok(date_csv(&store.load_date(date)?)),
        (Some(date), ExportFormat::Json) => Ok(serde_json::to_string_pretty(&store.load_date(date)?)?),
        (None, ExportFormat::Csv) => Ok(all_dates_csv(&AttendanceView::all_dates(store)?)),
        (None, ExportFormat::Json) => Ok(serde_json::to_string_pretty(&store.load()?)?),
    }
}

/// Suggested file name for an export made on `today`.
#[must_use]
pub fn file_name(date: Option<&str>, today: &str, format: ExportFormat) -> String {
    match date {
        Some(date) => format!("attendance_data_{date}.{}", format.extension()),
        None => format!("all_attendance_data_{today}.{}", format.extension()),
    }
}

/// CSV of one date's records.
#[must_use]
pub fn date_csv(records: &[AttendanceRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, RECORD_COLUMNS.iter().copied());
    for record in records {
        push_row(&mut out, record_fields(record).iter().map(String::as_str));
    }
    out
}

/// CSV of an all-dates view, with a leading `Date` column.
#[must_use]
pub fn all_dates_csv(view: &AttendanceView) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        std::iter::once("Date").chain(RECORD_COLUMNS.iter().copied()),
    );
    for dated in &view.records {
        let fields = record_fields(&dated.record);
        push_row(
            &mut out,
            std::iter::once(dated.date.as_str()).chain(fields.iter().map(String::as_str)),
        );
    }
    out
}

fn record_fields(record: &AttendanceRecord) -> [String; 7] {
    let Meals {
        breakfast,
        lunch,
        dinner,
    } = record.meals;
    [
        record.id.to_string(),
        record.student_name.clone(),
        record.status.to_string(),
        yes_no(breakfast).to_string(),
        yes_no(lunch).to_string(),
        yes_no(dinner).to_string(),
        record.timestamp.clone(),
    ]
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use tempfile::TempDir;

    use super::*;
    use crate::clock::FixedClock;
    use crate::record::AttendanceStatus;

    fn populated_store(dir: &TempDir) -> AttendanceStore {
        let start = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .unwrap();
        let clock = Arc::new(FixedClock::new(start));
        let store =
            AttendanceStore::new(dir.path().join("attendance.json")).with_clock(Arc::clone(&clock));

        store
            .append("Ada", AttendanceStatus::Coming, Meals::new(true, false, true))
            .unwrap();
        clock.advance(Duration::days(1));
        store
            .append(
                "Hopper, Grace",
                AttendanceStatus::NotComing,
                Meals::default(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_date_csv() {
        let dir = TempDir::new().unwrap();
        let store = populated_store(&dir);

        let csv = export(&store, Some("2024-03-15"), ExportFormat::Csv).unwrap();
        assert_eq!(
            csv,
            "ID,Student Name,Status,Breakfast,Lunch,Dinner,Timestamp\r\n\
             1,Ada,Coming,Yes,No,Yes,2024-03-15 09:00:00\r\n"
        );
    }

    #[test]
    fn test_all_dates_csv_quotes_and_orders() {
        let dir = TempDir::new().unwrap();
        let store = populated_store(&dir);

        let csv = export(&store, None, ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Date,ID,Student Name,Status,Breakfast,Lunch,Dinner,Timestamp"
        );
        assert_eq!(
            lines[1],
            "2024-03-16,1,\"Hopper, Grace\",Not Coming,No,No,No,2024-03-16 09:00:00"
        );
        assert!(lines[2].starts_with("2024-03-15,1,Ada,Coming"));
    }

    #[test]
    fn test_quote_escaping() {
        let mut out = String::new();
        push_field(&mut out, "say \"hi\"");
        assert_eq!(out, "\"say \"\"hi\"\"\"");

        let mut out = String::new();
        push_field(&mut out, "Lovelace, Ada");
        push_field(&mut out, "plain");
        assert_eq!(out, "\"Lovelace, Ada\"plain");
    }

    #[test]
    fn test_json_exports() {
        let dir = TempDir::new().unwrap();
        let store = populated_store(&dir);

        let one: Vec<AttendanceRecord> = serde_json::from_str(
            &export(&store, Some("2024-03-15"), ExportFormat::Json).unwrap(),
        )
        .unwrap();
        assert_eq!(one.len(), 1);

        let all: serde_json::Value =
            serde_json::from_str(&export(&store, None, ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(all.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_date_exports_header_only() {
        let dir = TempDir::new().unwrap();
        let store = populated_store(&dir);

        let csv = export(&store, Some("2000-01-01"), ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name(Some("2024-03-15"), "2024-03-20", ExportFormat::Csv),
            "attendance_data_2024-03-15.csv"
        );
        assert_eq!(
            file_name(None, "2024-03-20", ExportFormat::Json),
            "all_attendance_data_2024-03-20.json"
        );
    }
}
