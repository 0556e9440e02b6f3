//! Error types for bar validation, plus the per-symbol skip status.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::Column;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("bars out of order at index {index}: {current} does not follow {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("empty series")]
    EmptySeries,
}

impl CoreError {
    /// Shorthand for the common "window longer than history" case.
    pub fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }
}

/// Why a symbol produced no scan record.
///
/// Scans keep going past a skipped symbol; the reason stays inspectable.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid bars: {message}")]
    InvalidBars { message: String },

    #[error("price {price:.2} outside [{min:.2}, {max:.2}]")]
    PriceOutOfRange { price: f64, min: f64, max: f64 },

    #[error("volume {volume:.0} below minimum {min:.0}")]
    VolumeTooLow { volume: f64, min: f64 },

    #[error("{column} undefined on the latest bar")]
    UndefinedIndicator { column: Column },

    #[error("no setup or near-miss")]
    NoSignal,
}

impl From<CoreError> for SkipReason {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientData {
                required,
                available,
            } => SkipReason::InsufficientHistory {
                required,
                available,
            },
            other => SkipReason::InvalidBars {
                message: other.to_string(),
            },
        }
    }
}
