//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::record::{AttendanceStatus, Meals};

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Student name
    pub name: String,

    /// Attendance status
    #[arg(short, long, value_enum)]
    pub status: StatusArg,

    /// Request breakfast
    #[arg(short, long)]
    pub breakfast: bool,

    /// Request lunch
    #[arg(short, long)]
    pub lunch: bool,

    /// Request dinner
    #[arg(short, long)]
    pub dinner: bool,
}

impl SubmitCommand {
    /// The trimmed student name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty after trimming.
    pub fn student_name(&self) -> Result<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_record("student name is empty"));
        }
        Ok(name)
    }

    /// The requested meals.
    #[must_use]
    pub fn meals(&self) -> Meals {
        Meals::new(self.breakfast, self.lunch, self.dinner)
    }
}

/// View command arguments.
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Date to show (YYYY-MM-DD); defaults to today
    #[arg(short, long, conflicts_with = "all")]
    pub date: Option<String>,

    /// Show every date combined
    #[arg(short, long)]
    pub all: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dates command arguments.
#[derive(Debug, Args)]
pub struct DatesCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Which data a reset removes.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ResetScope {
    /// Remove all history
    #[arg(short, long)]
    pub all: bool,

    /// Remove one date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Remove today's records
    #[arg(short, long)]
    pub today: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// What to reset
    #[command(flatten)]
    pub scope: ResetScope,

    /// Admin password
    #[arg(short, long, env = "ROLLCALL_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Date to export (YYYY-MM-DD); all dates if omitted
    #[arg(short, long)]
    pub date: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Admin password
    #[arg(short, long, env = "ROLLCALL_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Attendance status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// The student will attend
    Coming,
    /// The student will not attend
    NotComing,
}

impl From<StatusArg> for AttendanceStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Coming => Self::Coming,
            StatusArg::NotComing => Self::NotComing,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    /// Comma-separated values
    #[default]
    Csv,
    /// JSON
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}
