//! Error types for the trend engine

use thiserror::Error;

/// Errors surfaced by [`compute_trend`](crate::engine::compute_trend)
///
/// Insufficient history is not an error: it degrades to `None` fields and an
/// informational alert instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrendError {
    #[error("invalid measurement at index {index}: {reason}")]
    InvalidMeasurement { index: usize, reason: String },

    #[error("series has {len} measurements, maximum is {max}")]
    SeriesTooLong { len: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrendError {
    pub(crate) fn invalid(index: usize, reason: impl Into<String>) -> Self {
        TrendError::InvalidMeasurement {
            index,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TrendError::InvalidMeasurement { .. } => "invalid_measurement",
            TrendError::SeriesTooLong { .. } => "series_too_long",
            TrendError::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, TrendError>;
