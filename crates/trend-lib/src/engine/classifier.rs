//! Threshold classification and short-term direction

use super::TrendConfig;
use crate::models::{Classification, TrendDirection};

/// Percent change considered a moderate move
const MODERATE_CHANGE_PERCENT: f64 = 10.0;

/// Percent change considered a significant move
const SIGNIFICANT_CHANGE_PERCENT: f64 = 25.0;

/// Bucket the latest total marker against the configured thresholds
pub fn classify(value: f64, config: &TrendConfig) -> Classification {
    if value >= config.high_min {
        Classification::High
    } else if value >= config.normal_max {
        Classification::Elevated
    } else {
        Classification::Normal
    }
}

/// Direction of `current` relative to `previous`
///
/// Undefined when the previous value is zero.
pub fn direction(previous: f64, current: f64) -> Option<TrendDirection> {
    if previous <= 0.0 {
        return None;
    }

    let change_percent = (current - previous) / previous * 100.0;
    let direction = if change_percent > SIGNIFICANT_CHANGE_PERCENT {
        TrendDirection::RisingSignificant
    } else if change_percent > MODERATE_CHANGE_PERCENT {
        TrendDirection::RisingModerate
    } else if change_percent < -SIGNIFICANT_CHANGE_PERCENT {
        TrendDirection::DecliningSignificant
    } else if change_percent < -MODERATE_CHANGE_PERCENT {
        TrendDirection::DecliningModerate
    } else {
        TrendDirection::Stable
    };
    Some(direction)
}
