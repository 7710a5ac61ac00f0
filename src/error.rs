//! Error types for u-profile.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by u-profile operations.
///
/// Degenerate data (empty, constant, single category) is never an error:
/// those cases surface as undefined statistics inside a successful report.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ProfileError {
    /// Requested column is absent from the table.
    #[error("column '{name}' not found")]
    ColumnNotFound { name: String },
    /// A quantile level outside `[0, 1]` (or not finite) was requested.
    #[error("quantile level {level} is outside [0, 1]")]
    InvalidQuantile { level: f64 },
    /// A configuration parameter is out of range.
    #[error("invalid configuration for '{parameter}': {reason}")]
    InvalidConfiguration { parameter: String, reason: String },
    /// A comparison sample contains no value that can be read as a number.
    #[error("sample '{sample}' contains no numeric values")]
    NonNumericSample { sample: String },
    /// A comparison sample has no finite values left after dropping missing entries.
    #[error("sample '{sample}' is empty after removing missing values")]
    EmptyAfterCleaning { sample: String },
    /// Column length does not match the table's row count.
    #[error("expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ProfileError {
    pub(crate) fn invalid_config(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by the caller's request rather
    /// than by the data. Batch comparison stops on these instead of
    /// recording a per-pair failure.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::NonNumericSample { .. } | Self::EmptyAfterCleaning { .. }
        )
    }
}
