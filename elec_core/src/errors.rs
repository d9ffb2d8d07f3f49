//! # Error Types
//!
//! Structured error types for elec_core. Every failure in this crate is a
//! user-correctable input problem or an I/O problem; there is no fatal class.
//!
//! ## Example
//!
//! ```rust
//! use elec_core::errors::{ElecError, ElecResult};
//!
//! fn validate_rating(rating_w: f64) -> ElecResult<()> {
//!     if rating_w <= 0.0 {
//!         return Err(ElecError::invalid_input(
//!             "rating_w",
//!             rating_w.to_string(),
//!             "Rating must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for elec_core operations
pub type ElecResult<T> = Result<T, ElecError>;

/// Structured error type for engine operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ElecError {
    /// An input value is invalid (out of range, empty, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No load item with this id exists in the schedule
    #[error("Load item not found: {id}")]
    ItemNotFound { id: Uuid },

    /// Conductor size is not in the standard size table
    #[error("Conductor size not found: {size_mm2} mm²")]
    ConductorNotFound { size_mm2: f64 },

    /// Calculation could not produce a result (e.g., no adequate conductor)
    #[error("Calculation failed: {calculation_type} - {reason}")]
    CalculationFailed {
        calculation_type: String,
        reason: String,
    },

    /// Saved calculation not found in a store
    #[error("Saved calculation not found: {id}")]
    NotFound { id: Uuid },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl ElecError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ElecError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        ElecError::MissingField {
            field: field.into(),
        }
    }

    /// Create a CalculationFailed error
    pub fn calculation_failed(calculation_type: impl Into<String>, reason: impl Into<String>) -> Self {
        ElecError::CalculationFailed {
            calculation_type: calculation_type.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        ElecError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        ElecError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable error
    pub fn serialization(err: impl std::fmt::Display) -> Self {
        ElecError::SerializationError {
            reason: err.to_string(),
        }
    }

    /// True for validation problems the user can fix by editing input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ElecError::InvalidInput { .. } | ElecError::MissingField { .. }
        )
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ElecError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ElecError::InvalidInput { .. } => "INVALID_INPUT",
            ElecError::MissingField { .. } => "MISSING_FIELD",
            ElecError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            ElecError::ConductorNotFound { .. } => "CONDUCTOR_NOT_FOUND",
            ElecError::CalculationFailed { .. } => "CALCULATION_FAILED",
            ElecError::NotFound { .. } => "NOT_FOUND",
            ElecError::FileError { .. } => "FILE_ERROR",
            ElecError::FileLocked { .. } => "FILE_LOCKED",
            ElecError::SerializationError { .. } => "SERIALIZATION_ERROR",
            ElecError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = ElecError::invalid_input("rating_w", "-5", "Rating must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: ElecError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ElecError::missing_field("description").error_code(), "MISSING_FIELD");
        assert_eq!(
            ElecError::ConductorNotFound { size_mm2: 7.0 }.error_code(),
            "CONDUCTOR_NOT_FOUND"
        );
        assert_eq!(ElecError::ItemNotFound { id: Uuid::nil() }.error_code(), "ITEM_NOT_FOUND");
    }

    #[test]
    fn test_validation_classification() {
        assert!(ElecError::invalid_input("x", "0", "bad").is_validation());
        assert!(!ElecError::serialization("eof").is_validation());
        assert!(ElecError::file_locked("a.lsch", "someone", "now").is_recoverable());
    }
}
