//! `rollcall` - Daily student attendance and meal tracking
//!
//! This library provides a file-backed store of per-date attendance records,
//! the statistics derived from them, and the views and exports built on top.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod record;
pub mod store;
pub mod view;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use logging::init_logging;
pub use record::{AttendanceRecord, AttendanceStats, AttendanceStatus, Meals};
pub use store::{AttendanceDocument, AttendanceStore, DocumentState, Malformation, RecoveryPolicy};
pub use view::{AttendanceView, DatedRecord};
