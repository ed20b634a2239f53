//! Trend & alert engine
//!
//! [`compute_trend`] is a pure function of the series and the configuration:
//! it validates every measurement, sorts by timestamp, derives ratio,
//! velocity, doubling time and classification, then evaluates alert rules.
//! [`TrendEngine`] wraps it with metrics and structured logging for hosts.

mod alerts;
mod classifier;
mod config;
mod regression;

pub use alerts::{evaluate as evaluate_alerts, AlertInputs};
pub use classifier::{classify, direction};
pub use config::{
    TrendConfig, DEFAULT_HIGH_MIN, DEFAULT_MAX_SERIES_LEN, DEFAULT_NORMAL_MAX,
    DEFAULT_RAPID_DOUBLING_DAYS, DEFAULT_RATIO_RISK_MIN, DEFAULT_VELOCITY_ALERT_MIN,
};
pub use regression::{days_between, fit, log_growth_fit, velocity_fit, LinearFit, DAYS_PER_YEAR};

use std::time::Instant;

use tracing::debug;

use crate::error::{Result, TrendError};
use crate::models::{Classification, Measurement, RawMeasurement, TrendResult};
use crate::observability::{EngineMetrics, StructuredLogger};

/// Average days per month, used for month-based doubling thresholds
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Compute trend metrics and alerts for one subject's series
///
/// Input order does not matter; ties on timestamp keep input order.
/// Nothing is computed if any measurement is invalid.
pub fn compute_trend(series: &[Measurement], config: &TrendConfig) -> Result<TrendResult> {
    config.validate()?;

    if series.len() > config.max_series_len {
        return Err(TrendError::SeriesTooLong {
            len: series.len(),
            max: config.max_series_len,
        });
    }

    for (index, measurement) in series.iter().enumerate() {
        measurement.validate(index)?;
    }

    let mut sorted = series.to_vec();
    // Vec::sort_by_key is stable
    sorted.sort_by_key(|m| m.timestamp);

    let duplicate_timestamps = sorted
        .windows(2)
        .filter(|w| w[0].timestamp == w[1].timestamp)
        .count();

    let latest_total = sorted.last().map(|m| m.total_marker);
    let previous_total = sorted
        .len()
        .checked_sub(2)
        .map(|i| sorted[i].total_marker);

    let ratio = sorted.iter().rev().find_map(Measurement::ratio);

    let window = &sorted[sorted.len() - config.regression_window(sorted.len())..];
    let velocity = estimate_velocity(window, config);
    let doubling_time_days = match velocity {
        Some(v) if v > 0.0 => estimate_doubling_days(window),
        _ => None,
    };

    let classification = latest_total
        .map(|v| classify(v, config))
        .unwrap_or(Classification::Normal);

    let direction = match (previous_total, latest_total) {
        (Some(prev), Some(last)) => direction(prev, last),
        _ => None,
    };

    let alerts = evaluate_alerts(
        &AlertInputs {
            classification,
            latest_total,
            ratio,
            doubling_time_days,
            velocity,
            measurement_count: sorted.len(),
            duplicate_timestamps,
        },
        config,
    );

    debug!(
        measurements = sorted.len(),
        window = window.len(),
        velocity = ?velocity,
        doubling_time_days = ?doubling_time_days,
        classification = %classification,
        alerts = alerts.len(),
        "Trend computed"
    );

    Ok(TrendResult {
        ratio,
        velocity,
        doubling_time_days,
        classification,
        alerts,
        latest_total,
        previous_total,
        direction,
        measurement_count: sorted.len(),
        duplicate_timestamps,
    })
}

/// Parse raw records, then [`compute_trend`]
pub fn compute_trend_raw(series: &[RawMeasurement], config: &TrendConfig) -> Result<TrendResult> {
    let parsed = parse_series(series)?;
    compute_trend(&parsed, config)
}

/// Parse every raw record, failing on the first invalid one
pub fn parse_series(series: &[RawMeasurement]) -> Result<Vec<Measurement>> {
    series
        .iter()
        .enumerate()
        .map(|(index, raw)| raw.parse(index))
        .collect()
}

fn distinct_timestamps(samples: &[Measurement]) -> usize {
    // samples are sorted, so equal timestamps are adjacent
    1 + samples
        .windows(2)
        .filter(|w| w[0].timestamp != w[1].timestamp)
        .count()
}

fn estimate_velocity(window: &[Measurement], config: &TrendConfig) -> Option<f64> {
    if window.is_empty() || distinct_timestamps(window) < config.min_points_for_velocity {
        return None;
    }
    velocity_fit(window).map(|fit| fit.slope)
}

fn estimate_doubling_days(window: &[Measurement]) -> Option<f64> {
    let fit = log_growth_fit(window)?;
    if fit.slope > 0.0 {
        Some(std::f64::consts::LN_2 / fit.slope)
    } else {
        None
    }
}

/// Engine handle for services: computes, records metrics, logs the outcome
#[derive(Clone)]
pub struct TrendEngine {
    config: TrendConfig,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl TrendEngine {
    pub fn new(config: TrendConfig, logger: StructuredLogger) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: EngineMetrics::new(),
            logger,
        })
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyze with the engine's configuration
    pub fn analyze(&self, subject: &str, series: &[RawMeasurement]) -> Result<TrendResult> {
        self.analyze_with(subject, series, &self.config)
    }

    /// Analyze with a per-request configuration
    pub fn analyze_with(
        &self,
        subject: &str,
        series: &[RawMeasurement],
        config: &TrendConfig,
    ) -> Result<TrendResult> {
        let started = Instant::now();
        let outcome = compute_trend_raw(series, config);
        self.metrics
            .observe_compute_latency(started.elapsed().as_secs_f64());

        match &outcome {
            Ok(result) => {
                self.metrics.inc_computations();
                self.metrics.observe_series_length(result.measurement_count);
                for alert in &result.alerts {
                    self.metrics.inc_alert(alert.severity);
                    self.logger.log_alert(subject, alert);
                }
                self.logger.log_trend(subject, result);
            }
            Err(err) => {
                self.metrics.inc_invalid_inputs();
                self.logger.log_rejected(subject, err);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertReason, AlertSeverity, TrendDirection};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap()
    }

    /// One Julian year, so the regression x-axis is exactly 1.0
    fn year() -> Duration {
        Duration::seconds(31_557_600)
    }

    fn reasons(result: &TrendResult) -> Vec<AlertReason> {
        result.alerts.iter().map(|a| a.reason).collect()
    }

    #[test]
    fn test_two_points_one_year_apart() {
        let series = vec![
            Measurement::new(t0(), 2.0),
            Measurement::new(t0() + year(), 4.0),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();

        assert!((result.velocity.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(result.classification, Classification::Elevated);
        let elevated: Vec<_> = result
            .alerts
            .iter()
            .filter(|a| a.reason == AlertReason::ElevatedMarker)
            .collect();
        assert_eq!(elevated.len(), 1);
        assert_eq!(elevated[0].severity, AlertSeverity::Warning);
        // value doubled in a year
        let doubling = result.doubling_time_days.unwrap();
        assert!((doubling - DAYS_PER_YEAR).abs() < 1e-6);
        assert!(!result.has_alert(AlertReason::HighVelocity));
        assert_eq!(result.direction, Some(TrendDirection::RisingSignificant));
    }

    #[test]
    fn test_single_point_with_free_marker() {
        let series = vec![Measurement::new(t0(), 5.0).with_free(0.4)];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();

        assert!((result.ratio.unwrap() - 8.0).abs() < 1e-12);
        assert_eq!(result.classification, Classification::Elevated);
        assert_eq!(result.velocity, None);
        assert_eq!(result.doubling_time_days, None);
        assert_eq!(
            reasons(&result),
            vec![
                AlertReason::ElevatedMarker,
                AlertReason::LowFreeRatio,
                AlertReason::InsufficientHistory,
            ]
        );
    }

    #[test]
    fn test_result_json_roundtrip() {
        let series = vec![
            Measurement::new(t0(), 3.1).with_free(0.55),
            Measurement::new(t0() + Duration::days(61), 3.7),
            Measurement::new(t0() + Duration::days(123), 4.3).with_free(0.41),
            Measurement::new(t0() + Duration::days(187), 5.9),
            Measurement::new(t0() + Duration::days(187), 6.2),
            Measurement::new(t0() + Duration::days(250), 8.35).with_free(0.7),
            Measurement::new(t0() + Duration::days(311), 11.2).with_free(0.9),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert!(result.velocity.is_some());
        assert!(result.doubling_time_days.is_some());
        assert!(result.alerts.len() > 2);

        let json = serde_json::to_string(&result).unwrap();
        let decoded: TrendResult = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, result);
        assert_eq!(decoded.doubling_time_months(), result.doubling_time_months());
    }

    #[test]
    fn test_empty_series() {
        let result = compute_trend(&[], &TrendConfig::default()).unwrap();

        assert_eq!(result.ratio, None);
        assert_eq!(result.velocity, None);
        assert_eq!(result.doubling_time_days, None);
        assert_eq!(result.latest_total, None);
        assert_eq!(result.direction, None);
        assert_eq!(result.measurement_count, 0);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.alerts[0].severity, AlertSeverity::Info);
        assert_eq!(result.alerts[0].reason, AlertReason::InsufficientHistory);
    }

    #[test]
    fn test_negative_total_rejected() {
        let series = vec![
            Measurement::new(t0(), 1.0),
            Measurement::new(t0() + year(), -1.0),
        ];
        let err = compute_trend(&series, &TrendConfig::default()).unwrap_err();
        assert!(matches!(err, TrendError::InvalidMeasurement { index: 1, .. }));
    }

    #[test]
    fn test_order_independent() {
        let mut series: Vec<Measurement> = (0..6)
            .map(|i| Measurement::new(t0() + Duration::days(90 * i), 1.0 + i as f64 * 0.7))
            .collect();
        series[2].free_marker = Some(0.5);
        let forward = compute_trend(&series, &TrendConfig::default()).unwrap();

        series.reverse();
        series.swap(1, 4);
        let shuffled = compute_trend(&series, &TrendConfig::default()).unwrap();

        assert_eq!(forward, shuffled);
        // idempotent
        assert_eq!(shuffled, compute_trend(&series, &TrendConfig::default()).unwrap());
    }

    #[test]
    fn test_monotonic_increase_gives_positive_velocity() {
        let series: Vec<Measurement> = (0..8)
            .map(|i| Measurement::new(t0() + Duration::days(30 * i), 0.5 + i as f64 * 0.05))
            .collect();
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert!(result.velocity.unwrap() > 0.0);
        assert!(result.doubling_time_days.unwrap() > 0.0);
    }

    #[test]
    fn test_declining_series_has_no_doubling_time() {
        let series: Vec<Measurement> = (0..5)
            .map(|i| Measurement::new(t0() + Duration::days(60 * i), 8.0 - i as f64))
            .collect();
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert!(result.velocity.unwrap() < 0.0);
        assert_eq!(result.doubling_time_days, None);
        assert!(!result.has_alert(AlertReason::RapidDoubling));
    }

    #[test]
    fn test_ratio_uses_latest_complete_measurement() {
        let series = vec![
            Measurement::new(t0(), 2.0).with_free(0.6),
            Measurement::new(t0() + Duration::days(100), 3.0).with_free(0.3),
            Measurement::new(t0() + Duration::days(200), 3.0),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert!((result.ratio.unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_timestamps_flagged() {
        let series = vec![
            Measurement::new(t0(), 1.0),
            Measurement::new(t0(), 1.2),
            Measurement::new(t0() + Duration::days(180), 1.4),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert_eq!(result.duplicate_timestamps, 1);
        assert!(result.has_alert(AlertReason::DuplicateTimestamp));
        assert!(result.velocity.is_some());
    }

    #[test]
    fn test_ties_keep_input_order() {
        let series = vec![
            Measurement::new(t0(), 1.0),
            Measurement::new(t0() + Duration::days(10), 3.0),
            Measurement::new(t0() + Duration::days(10), 5.0),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert_eq!(result.latest_total, Some(5.0));
        assert_eq!(result.previous_total, Some(3.0));
    }

    #[test]
    fn test_same_timestamp_only_has_no_velocity() {
        let series = vec![Measurement::new(t0(), 1.0), Measurement::new(t0(), 2.0)];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert_eq!(result.velocity, None);
        assert!(!result.has_alert(AlertReason::InsufficientHistory));
    }

    #[test]
    fn test_min_points_for_velocity() {
        let series: Vec<Measurement> = (0..3)
            .map(|i| Measurement::new(t0() + Duration::days(30 * i), 1.0 + i as f64))
            .collect();
        let config = TrendConfig {
            min_points_for_velocity: 4,
            ..TrendConfig::default()
        };
        let result = compute_trend(&series, &config).unwrap();
        assert_eq!(result.velocity, None);
    }

    #[test]
    fn test_velocity_window_uses_recent_points() {
        // flat for a year, then rising
        let mut series: Vec<Measurement> = (0..4)
            .map(|i| Measurement::new(t0() + Duration::days(90 * i), 1.0))
            .collect();
        series.push(Measurement::new(t0() + Duration::days(270) + year(), 3.0));

        let all = compute_trend(&series, &TrendConfig::default()).unwrap();
        let recent =
            compute_trend(&series, &TrendConfig::default().with_velocity_window(2)).unwrap();

        assert!((recent.velocity.unwrap() - 2.0).abs() < 1e-9);
        assert!(all.velocity.unwrap() < recent.velocity.unwrap());
    }

    #[test]
    fn test_high_velocity_and_critical() {
        let series = vec![
            Measurement::new(t0(), 6.0),
            Measurement::new(t0() + year(), 12.0),
        ];
        let result = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert_eq!(result.classification, Classification::High);
        assert_eq!(
            reasons(&result),
            vec![
                AlertReason::HighMarker,
                AlertReason::RapidDoubling,
                AlertReason::HighVelocity,
            ]
        );
        assert_eq!(result.max_severity(), Some(AlertSeverity::Critical));
    }

    #[test]
    fn test_series_too_long() {
        let config = TrendConfig {
            max_series_len: 3,
            ..TrendConfig::default()
        };
        let series: Vec<Measurement> = (0..4)
            .map(|i| Measurement::new(t0() + Duration::days(i), 1.0))
            .collect();
        let err = compute_trend(&series, &config).unwrap_err();
        assert_eq!(err, TrendError::SeriesTooLong { len: 4, max: 3 });
    }

    #[test]
    fn test_raw_series_unparsable_timestamp() {
        let raw = vec![
            RawMeasurement {
                timestamp: "2024-01-01".to_string(),
                total_marker: 1.0,
                free_marker: None,
            },
            RawMeasurement {
                timestamp: "yesterday".to_string(),
                total_marker: 1.0,
                free_marker: None,
            },
        ];
        let err = compute_trend_raw(&raw, &TrendConfig::default()).unwrap_err();
        assert!(matches!(err, TrendError::InvalidMeasurement { index: 1, .. }));
    }

    #[test]
    fn test_engine_records_outcomes() {
        let engine =
            TrendEngine::new(TrendConfig::default(), StructuredLogger::new("test")).unwrap();
        let raw = vec![RawMeasurement {
            timestamp: "2024-01-01".to_string(),
            total_marker: 11.0,
            free_marker: Some(2.0),
        }];
        let result = engine.analyze("patient-1", &raw).unwrap();
        assert_eq!(result.classification, Classification::High);

        let bad = vec![RawMeasurement {
            timestamp: "2024-01-01".to_string(),
            total_marker: -3.0,
            free_marker: None,
        }];
        assert!(engine.analyze("patient-1", &bad).is_err());
    }
}
