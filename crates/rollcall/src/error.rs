//! Error types for rollcall.
//!
//! Malformed attendance documents never show up here: the store repairs them
//! in place. What remains are failures of the storage medium itself,
//! configuration problems, and validation errors raised by front ends.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// The backing document could not be created, read, or written.
    #[error("storage unavailable at {path} (failed to {operation}): {source}")]
    StorageUnavailable {
        /// Path that could not be accessed.
        path: PathBuf,
        /// What the store was trying to do.
        operation: &'static str,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// A date key is not in `YYYY-MM-DD` form.
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// A submitted record failed validation.
    #[error("invalid attendance record: {message}")]
    InvalidRecord {
        /// Description of the validation failure.
        message: String,
    },

    /// The admin credential did not match.
    #[error("unauthorized: invalid admin password")]
    Unauthorized,

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a storage-unavailable error for the given path and operation.
    #[must_use]
    pub fn storage(
        path: impl Into<PathBuf>,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a record validation error.
    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Check if this error means the storage medium is unreachable.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }

    /// Check if this error is an admin credential mismatch.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::storage("/root/forbidden/attendance.json", "write document", io_err);
        let msg = err.to_string();
        assert!(msg.contains("/root/forbidden/attendance.json"));
        assert!(msg.contains("write document"));
        assert!(msg.contains("access denied"));
    }

    #[test]
    fn test_is_storage_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(Error::storage("/tmp/x", "write document", io_err).is_storage_unavailable());
        assert!(!Error::Unauthorized.is_storage_unavailable());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::storage("/tmp/x", "read document", io_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(!Error::internal("x").is_unauthorized());
    }

    #[test]
    fn test_invalid_date_display() {
        let err = Error::InvalidDate {
            value: "15/03/2024".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid date '15/03/2024': expected YYYY-MM-DD"
        );
    }

    #[test]
    fn test_invalid_record_display() {
        let err = Error::invalid_record("student name is empty");
        assert_eq!(
            err.to_string(),
            "invalid attendance record: student name is empty"
        );
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "admin password is empty".to_string(),
        };
        assert!(err.to_string().contains("admin password is empty"));
    }
}
