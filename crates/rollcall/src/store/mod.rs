//! File-backed attendance store.
//!
//! The store owns a single JSON document mapping date keys to ordered record
//! partitions. Every operation reads the whole document and, when it mutates,
//! rewrites it in full. An in-process lock serializes these spans so that
//! callers sharing one store never lose each other's updates.

pub mod document;

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::record::{date_key, AttendanceRecord, AttendanceStats, AttendanceStatus, Meals};

pub use document::{AttendanceDocument, DocumentState, Malformation, RecoveryPolicy};

use document::{parse_document, render_document, EMPTY_DOCUMENT};

/// Timestamp suffix format for backups of malformed documents.
const BACKUP_SUFFIX_FORMAT: &str = "%Y%m%d%H%M%S";

/// Persistent store of attendance records.
///
/// Create one per process and share it by reference (or `Arc`) with every
/// consumer.
#[derive(Debug)]
pub struct AttendanceStore {
    /// Path to the document.
    path: PathBuf,
    /// What to do with malformed content.
    recovery: RecoveryPolicy,
    /// Source of "today" and record timestamps.
    clock: Box<dyn Clock>,
    /// Serializes read-modify-write spans.
    lock: Mutex<()>,
}

impl AttendanceStore {
    /// Create a store for the document at `path`.
    ///
    /// Nothing touches the filesystem until the first operation; call
    /// [`AttendanceStore::initialize`] to create or repair the document up front.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            recovery: RecoveryPolicy::default(),
            clock: Box::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    /// Create a store and initialize its document.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage location cannot be created, read, or written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(path);
        store.initialize()?;
        Ok(store)
    }

    /// Use the given clock for "today" and record timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use the given policy for malformed documents.
    #[must_use]
    pub fn with_recovery_policy(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    /// Get the path to the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the recovery policy in effect.
    #[must_use]
    pub fn recovery_policy(&self) -> RecoveryPolicy {
        self.recovery
    }

    /// Today's date key according to the store's clock.
    #[must_use]
    pub fn today(&self) -> String {
        date_key(self.clock.today())
    }

    /// Ensure the document exists and is well formed.
    ///
    /// Missing documents are created empty. Malformed ones are repaired
    /// according to the recovery policy. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the storage location cannot be
    /// created, read, or written. Malformed content is never an error.
    pub fn initialize(&self) -> Result<DocumentState> {
        let _guard = self.guard();
        let (_, state) = self.read_document()?;
        debug!("Attendance document at {} is {:?}", self.path.display(), state);
        Ok(state)
    }

    /// Load the full document.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage medium is unavailable.
    pub fn load(&self) -> Result<AttendanceDocument> {
        let _guard = self.guard();
        let (document, _) = self.read_document()?;
        Ok(document)
    }

    /// Load the records of one date, or an empty list if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage medium is unavailable.
    pub fn load_date(&self, date: &str) -> Result<Vec<AttendanceRecord>> {
        let _guard = self.guard();
        let (mut document, _) = self.read_document()?;
        Ok(document.remove(date).unwrap_or_default())
    }

    /// All dates that have a partition, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage medium is unavailable.
    pub fn available_dates(&self) -> Result<Vec<String>> {
        let _guard = self.guard();
        let (document, _) = self.read_document()?;
        Ok(document.into_keys().rev().collect())
    }

    /// Append a record to today's partition.
    ///
    /// The record id is the partition's length plus one and the timestamp is
    /// the clock's current time. The caller is responsible for validating the
    /// name and status.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or written.
    pub fn append(
        &self,
        student_name: &str,
        status: AttendanceStatus,
        meals: Meals,
    ) -> Result<AttendanceRecord> {
        let _guard = self.guard();
        let now = self.clock.now();
        let today = date_key(now.date());

        let (mut document, _) = self.read_document()?;
        let partition = document.entry(today.clone()).or_default();
        let id = u32::try_from(partition.len() + 1)
            .map_err(|_| Error::internal(format!("partition {today} is full")))?;

        let record = AttendanceRecord::new(id, student_name, status, meals, now);
        partition.push(record.clone());
        self.write_document(&document)?;

        debug!(
            "Added attendance record {} for {} on {}",
            record.id, record.student_name, today
        );
        Ok(record)
    }

    /// Discard all history.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn reset_all(&self) -> Result<()> {
        let _guard = self.guard();
        self.write_raw(EMPTY_DOCUMENT)?;
        info!("All attendance data reset");
        Ok(())
    }

    /// Remove the partition for `date` (today if `None`).
    ///
    /// Returns `true` if a partition was removed, `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or written.
    pub fn reset_date(&self, date: Option<&str>) -> Result<bool> {
        let _guard = self.guard();
        let date = date.map_or_else(|| self.today(), str::to_string);

        let (mut document, _) = self.read_document()?;
        if document.remove(&date).is_none() {
            debug!("No attendance data found for {} to reset", date);
            return Ok(false);
        }

        self.write_document(&document)?;
        info!("Attendance data for {} reset", date);
        Ok(true)
    }

    /// Aggregate statistics over the given records. Performs no I/O.
    #[must_use]
    pub fn stats(records: &[AttendanceRecord]) -> AttendanceStats {
        AttendanceStats::from_records(records)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the document, creating or repairing it as needed.
    ///
    /// Callers must hold the lock.
    fn read_document(&self) -> Result<(AttendanceDocument, DocumentState)> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.write_raw(EMPTY_DOCUMENT)?;
                info!("Created attendance document at {}", self.path.display());
                return Ok((AttendanceDocument::new(), DocumentState::Created));
            }
            Err(source) => return Err(Error::storage(&self.path, "read document", source)),
        };

        match parse_document(&bytes) {
            Ok(document) => Ok((document, DocumentState::Valid)),
            Err(reason) => {
                self.recover(&reason)?;
                Ok((AttendanceDocument::new(), DocumentState::Recovered(reason)))
            }
        }
    }

    fn recover(&self, reason: &Malformation) -> Result<()> {
        warn!(
            "Malformed attendance document at {}: {}; resetting to empty (policy: {})",
            self.path.display(),
            reason,
            self.recovery
        );

        if self.recovery == RecoveryPolicy::Backup {
            let backup = self.backup_path();
            fs::rename(&self.path, &backup)
                .map_err(|source| Error::storage(&backup, "back up malformed document", source))?;
            warn!("Malformed document moved to {}", backup.display());
        }

        self.write_raw(EMPTY_DOCUMENT)
    }

    /// Pick a backup name that does not exist yet.
    ///
    /// Two recoveries within the same second get `-1`, `-2`, ... appended so
    /// an earlier backup is never overwritten.
    fn backup_path(&self) -> PathBuf {
        let suffix = self.clock.now().format(BACKUP_SUFFIX_FORMAT);
        let mut base = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("attendance"), OsString::from);
        base.push(format!(".corrupt-{suffix}"));

        let mut candidate = self.path.with_file_name(&base);
        let mut counter = 1u32;
        while candidate.exists() {
            let mut name = base.clone();
            name.push(format!("-{counter}"));
            candidate = self.path.with_file_name(name);
            counter += 1;
        }
        candidate
    }

    fn write_document(&self, document: &AttendanceDocument) -> Result<()> {
        self.write_raw(&render_document(document)?)
    }

    /// Replace the document with `content`.
    ///
    /// Writes a sibling temporary file and renames it over the document, so a
    /// failed write never leaves a truncated document behind.
    fn write_raw(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|source| Error::storage(parent, "create directory", source))?;
            }
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, content)
            .map_err(|source| Error::storage(&tmp, "write document", source))?;
        fs::rename(&tmp, &self.path)
            .map_err(|source| Error::storage(&self.path, "replace document", source))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("attendance"), OsString::from);
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
