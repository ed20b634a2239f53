//! Core data models for the trend engine

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// A single validated lab result for one subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    /// Total PSA (ng/mL)
    pub total_marker: f64,
    /// Free PSA (ng/mL), when the lab reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_marker: Option<f64>,
}

impl Measurement {
    pub fn new(timestamp: DateTime<Utc>, total_marker: f64) -> Self {
        Self {
            timestamp,
            total_marker,
            free_marker: None,
        }
    }

    pub fn with_free(mut self, free_marker: f64) -> Self {
        self.free_marker = Some(free_marker);
        self
    }

    /// Check value domains; `index` is the position in the caller's series
    pub fn validate(&self, index: usize) -> Result<()> {
        if !self.total_marker.is_finite() {
            return Err(TrendError::invalid(index, "total marker is not a finite number"));
        }
        if self.total_marker < 0.0 {
            return Err(TrendError::invalid(
                index,
                format!("total marker {} is negative", self.total_marker),
            ));
        }
        if let Some(free) = self.free_marker {
            if !free.is_finite() {
                return Err(TrendError::invalid(index, "free marker is not a finite number"));
            }
            if free < 0.0 {
                return Err(TrendError::invalid(
                    index,
                    format!("free marker {} is negative", free),
                ));
            }
        }
        Ok(())
    }

    /// Free/total percentage, if both are present and total is non-zero
    pub fn ratio(&self) -> Option<f64> {
        let free = self.free_marker?;
        if self.total_marker > 0.0 {
            Some(free / self.total_marker * 100.0)
        } else {
            None
        }
    }
}

/// Unvalidated measurement as it arrives from data entry or lab import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// RFC 3339 date-time or `YYYY-MM-DD`
    pub timestamp: String,
    pub total_marker: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_marker: Option<f64>,
}

impl RawMeasurement {
    /// Parse the timestamp and validate values
    pub fn parse(&self, index: usize) -> Result<Measurement> {
        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            TrendError::invalid(index, format!("unparsable timestamp {:?}", self.timestamp))
        })?;

        let measurement = Measurement {
            timestamp,
            total_marker: self.total_marker,
            free_marker: self.free_marker,
        };
        measurement.validate(index)?;
        Ok(measurement)
    }
}

/// Accepts RFC 3339 date-times and plain calendar dates (midnight UTC)
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Risk bucket of the latest total marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Normal,
    Elevated,
    High,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Normal => write!(f, "NORMAL"),
            Classification::Elevated => write!(f, "ELEVATED"),
            Classification::High => write!(f, "HIGH"),
        }
    }
}

/// Change of the latest value relative to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    RisingSignificant,
    RisingModerate,
    Stable,
    DecliningModerate,
    DecliningSignificant,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::RisingSignificant => write!(f, "rising (significant)"),
            TrendDirection::RisingModerate => write!(f, "rising (moderate)"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::DecliningModerate => write!(f, "declining (moderate)"),
            TrendDirection::DecliningSignificant => write!(f, "declining (significant)"),
        }
    }
}

/// Alert severity levels, declared in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Critical => write!(f, "critical"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Info => write!(f, "info"),
        }
    }
}

/// Why an alert fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    HighMarker,
    ElevatedMarker,
    LowFreeRatio,
    RapidDoubling,
    HighVelocity,
    InsufficientHistory,
    DuplicateTimestamp,
}

impl AlertReason {
    /// Human-readable description for notification channels
    pub fn describe(&self) -> &'static str {
        match self {
            AlertReason::HighMarker => "PSA at or above the high threshold, intervention needed",
            AlertReason::ElevatedMarker => "PSA above the normal range",
            AlertReason::LowFreeRatio => "free/total PSA ratio below the risk threshold",
            AlertReason::RapidDoubling => "PSA doubling time shorter than the rapid-doubling limit",
            AlertReason::HighVelocity => "PSA velocity above the alert limit",
            AlertReason::InsufficientHistory => "not enough measurements for trend analysis",
            AlertReason::DuplicateTimestamp => {
                "series contains measurements with identical timestamps"
            }
        }
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertReason::HighMarker => write!(f, "high_marker"),
            AlertReason::ElevatedMarker => write!(f, "elevated_marker"),
            AlertReason::LowFreeRatio => write!(f, "low_free_ratio"),
            AlertReason::RapidDoubling => write!(f, "rapid_doubling"),
            AlertReason::HighVelocity => write!(f, "high_velocity"),
            AlertReason::InsufficientHistory => write!(f, "insufficient_history"),
            AlertReason::DuplicateTimestamp => write!(f, "duplicate_timestamp"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub reason: AlertReason,
    pub triggering_value: f64,
}

impl Alert {
    pub fn new(severity: AlertSeverity, reason: AlertReason, triggering_value: f64) -> Self {
        Self {
            severity,
            reason,
            triggering_value,
        }
    }
}

/// Derived trend metrics for one subject's series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    /// Free/total percentage of the most recent complete measurement
    pub ratio: Option<f64>,
    /// ng/mL per year
    pub velocity: Option<f64>,
    pub doubling_time_days: Option<f64>,
    pub classification: Classification,
    pub alerts: Vec<Alert>,
    pub latest_total: Option<f64>,
    pub previous_total: Option<f64>,
    pub direction: Option<TrendDirection>,
    pub measurement_count: usize,
    pub duplicate_timestamps: usize,
}

impl TrendResult {
    /// Highest severity present, if any alert fired
    pub fn max_severity(&self) -> Option<AlertSeverity> {
        self.alerts.iter().map(|a| a.severity).min()
    }

    pub fn has_alert(&self, reason: AlertReason) -> bool {
        self.alerts.iter().any(|a| a.reason == reason)
    }

    /// Doubling time converted to months (30.44 days)
    pub fn doubling_time_months(&self) -> Option<f64> {
        self.doubling_time_days.map(|d| d / crate::engine::DAYS_PER_MONTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_and_date() {
        let a = parse_timestamp("2024-03-01T10:30:00Z").unwrap();
        let b = parse_timestamp("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(a, b);

        let d = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        assert!(parse_timestamp("01/03/2024").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_raw_measurement_rejects_bad_timestamp() {
        let raw = RawMeasurement {
            timestamp: "not a date".to_string(),
            total_marker: 1.0,
            free_marker: None,
        };
        let err = raw.parse(3).unwrap_err();
        assert!(matches!(err, TrendError::InvalidMeasurement { index: 3, .. }));
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let ts = parse_timestamp("2024-01-01").unwrap();
        assert!(Measurement::new(ts, -1.0).validate(0).is_err());
        assert!(Measurement::new(ts, f64::NAN).validate(0).is_err());
        assert!(Measurement::new(ts, 1.0).with_free(-0.1).validate(0).is_err());
        assert!(Measurement::new(ts, 0.0).validate(0).is_ok());
    }

    #[test]
    fn test_ratio_requires_positive_total() {
        let ts = parse_timestamp("2024-01-01").unwrap();
        assert_eq!(Measurement::new(ts, 0.0).with_free(0.5).ratio(), None);
        assert_eq!(Measurement::new(ts, 5.0).ratio(), None);
        let r = Measurement::new(ts, 5.0).with_free(0.4).ratio().unwrap();
        assert!((r - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_severity_priority_order() {
        assert!(AlertSeverity::Critical < AlertSeverity::Warning);
        assert!(AlertSeverity::Warning < AlertSeverity::Info);
    }
}
