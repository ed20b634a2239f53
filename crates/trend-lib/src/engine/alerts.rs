//! Alert rule evaluation
//!
//! Rules run in a fixed order and the resulting list is stably sorted by
//! severity, so alerts of equal severity keep rule order.

use super::TrendConfig;
use crate::models::{Alert, AlertReason, AlertSeverity, Classification};

/// Derived values the alert rules look at
#[derive(Debug, Clone, Copy)]
pub struct AlertInputs {
    pub classification: Classification,
    pub latest_total: Option<f64>,
    pub ratio: Option<f64>,
    pub doubling_time_days: Option<f64>,
    pub velocity: Option<f64>,
    pub measurement_count: usize,
    pub duplicate_timestamps: usize,
}

/// Evaluate every rule and return alerts in priority order
pub fn evaluate(inputs: &AlertInputs, config: &TrendConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let latest = inputs.latest_total.unwrap_or(0.0);

    match (inputs.classification, inputs.latest_total) {
        (Classification::High, Some(_)) => {
            alerts.push(Alert::new(AlertSeverity::Critical, AlertReason::HighMarker, latest));
        }
        (Classification::Elevated, Some(_)) => {
            alerts.push(Alert::new(
                AlertSeverity::Warning,
                AlertReason::ElevatedMarker,
                latest,
            ));
        }
        _ => {}
    }

    if let Some(ratio) = inputs.ratio {
        if ratio < config.ratio_risk_min {
            alerts.push(Alert::new(AlertSeverity::Warning, AlertReason::LowFreeRatio, ratio));
        }
    }

    // Velocity and doubling are None below two points, which suppresses these
    if let Some(days) = inputs.doubling_time_days {
        if days < config.rapid_doubling_days {
            alerts.push(Alert::new(AlertSeverity::Warning, AlertReason::RapidDoubling, days));
        }
    }

    if let Some(velocity) = inputs.velocity {
        if velocity > config.velocity_alert_min {
            alerts.push(Alert::new(
                AlertSeverity::Warning,
                AlertReason::HighVelocity,
                velocity,
            ));
        }
    }

    if inputs.measurement_count < 2 {
        alerts.push(Alert::new(
            AlertSeverity::Info,
            AlertReason::InsufficientHistory,
            inputs.measurement_count as f64,
        ));
    }

    if inputs.duplicate_timestamps > 0 {
        alerts.push(Alert::new(
            AlertSeverity::Info,
            AlertReason::DuplicateTimestamp,
            inputs.duplicate_timestamps as f64,
        ));
    }

    alerts.sort_by_key(|a| a.severity);
    alerts
}
