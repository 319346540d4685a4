//! Validation Error Types

use thiserror::Error;

/// Errors raised while validating caller-supplied covariates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value outside its exclusive bounds
    #[error("{field} value {value} is out of range ({min}, {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value must be strictly positive
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// NaN or infinite input
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    /// Unrecognised sex label
    #[error("Invalid sex label: {0:?} (expected \"male\" or \"female\")")]
    InvalidSex(String),
}
