//! Thresholds and limits for trend computation

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrendError};

/// Default upper bound (exclusive) of the normal range, ng/mL
pub const DEFAULT_NORMAL_MAX: f64 = 4.0;

/// Default lower bound (inclusive) of the high range, ng/mL
pub const DEFAULT_HIGH_MIN: f64 = 10.0;

/// Free/total percentage below which the ratio is a risk factor
pub const DEFAULT_RATIO_RISK_MIN: f64 = 10.0;

/// Doubling faster than two years is flagged
pub const DEFAULT_RAPID_DOUBLING_DAYS: f64 = 730.0;

/// Velocity above 2 ng/mL/year is flagged
pub const DEFAULT_VELOCITY_ALERT_MIN: f64 = 2.0;

/// Upper bound on accepted series length
pub const DEFAULT_MAX_SERIES_LEN: usize = 5000;

/// Configuration for [`compute_trend`](super::compute_trend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Values below this are NORMAL
    pub normal_max: f64,
    /// Values at or above this are HIGH
    pub high_min: f64,
    /// Free/total percentage below which a WARNING is raised
    pub ratio_risk_min: f64,
    /// Distinct timestamps required before velocity is estimated
    pub min_points_for_velocity: usize,
    /// Number of most recent points used for regression (`None` = all)
    pub velocity_window: Option<usize>,
    /// Doubling times shorter than this raise a WARNING
    pub rapid_doubling_days: f64,
    /// Velocities strictly above this raise a WARNING
    pub velocity_alert_min: f64,
    /// Longer series are rejected
    pub max_series_len: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            normal_max: DEFAULT_NORMAL_MAX,
            high_min: DEFAULT_HIGH_MIN,
            ratio_risk_min: DEFAULT_RATIO_RISK_MIN,
            min_points_for_velocity: 2,
            velocity_window: None,
            rapid_doubling_days: DEFAULT_RAPID_DOUBLING_DAYS,
            velocity_alert_min: DEFAULT_VELOCITY_ALERT_MIN,
            max_series_len: DEFAULT_MAX_SERIES_LEN,
        }
    }
}

impl TrendConfig {
    /// Set classification thresholds
    pub fn with_thresholds(mut self, normal_max: f64, high_min: f64) -> Self {
        self.normal_max = normal_max;
        self.high_min = high_min;
        self
    }

    /// Restrict regression to the last `n` points
    pub fn with_velocity_window(mut self, n: usize) -> Self {
        self.velocity_window = Some(n);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("normal_max", self.normal_max),
            ("high_min", self.high_min),
            ("ratio_risk_min", self.ratio_risk_min),
            ("rapid_doubling_days", self.rapid_doubling_days),
            ("velocity_alert_min", self.velocity_alert_min),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(TrendError::InvalidConfig(format!("{} must be finite", name)));
            }
        }

        if self.normal_max > self.high_min {
            return Err(TrendError::InvalidConfig(format!(
                "normal_max ({}) exceeds high_min ({})",
                self.normal_max, self.high_min
            )));
        }
        if self.min_points_for_velocity < 2 {
            return Err(TrendError::InvalidConfig(
                "min_points_for_velocity must be at least 2".to_string(),
            ));
        }
        if self.max_series_len == 0 {
            return Err(TrendError::InvalidConfig(
                "max_series_len must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of trailing points fed to the regression
    pub(crate) fn regression_window(&self, available: usize) -> usize {
        let wanted = self
            .velocity_window
            .unwrap_or(available)
            .max(self.min_points_for_velocity);
        wanted.min(available)
    }
}
