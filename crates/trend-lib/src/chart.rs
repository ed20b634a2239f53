//! Chart projection of a measurement series
//!
//! Produces renderer-agnostic chart data. All presentation settings travel in
//! an explicit [`ChartOptions`] value, and projecting the same inputs twice
//! yields identical data, so a redraw is just another projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{compute_trend, velocity_fit, TrendConfig, DAYS_PER_YEAR};
use crate::error::Result;
use crate::models::{Classification, Measurement};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub title: String,
    pub unit: String,
    /// Draw the normal/high threshold lines
    pub show_thresholds: bool,
    /// Draw the velocity regression line
    pub show_regression: bool,
    /// Include free PSA as a second series
    pub show_free_marker: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "PSA trend".to_string(),
            unit: "ng/mL".to_string(),
            show_thresholds: true,
            show_regression: true,
            show_free_marker: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub total_marker: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_marker: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLine {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionLine {
    pub start: ChartPoint,
    pub end: ChartPoint,
    /// ng/mL per year
    pub slope_per_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub unit: String,
    pub classification: Classification,
    pub points: Vec<ChartPoint>,
    pub thresholds: Vec<ThresholdLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression: Option<RegressionLine>,
}

impl ChartData {
    /// Project a series into chart data
    ///
    /// Validation and sorting follow [`compute_trend`]; an invalid series
    /// yields the same error.
    pub fn project(
        series: &[Measurement],
        config: &TrendConfig,
        options: &ChartOptions,
    ) -> Result<Self> {
        let result = compute_trend(series, config)?;

        let mut sorted = series.to_vec();
        sorted.sort_by_key(|m| m.timestamp);

        let points = sorted
            .iter()
            .map(|m| ChartPoint {
                timestamp: m.timestamp,
                total_marker: m.total_marker,
                free_marker: if options.show_free_marker {
                    m.free_marker
                } else {
                    None
                },
            })
            .collect();

        let thresholds = if options.show_thresholds {
            vec![
                ThresholdLine {
                    label: "normal".to_string(),
                    value: config.normal_max,
                },
                ThresholdLine {
                    label: "high".to_string(),
                    value: config.high_min,
                },
            ]
        } else {
            Vec::new()
        };

        let regression = if options.show_regression && result.velocity.is_some() {
            regression_line(&sorted, config)
        } else {
            None
        };

        Ok(Self {
            title: options.title.clone(),
            unit: options.unit.clone(),
            classification: result.classification,
            points,
            thresholds,
            regression,
        })
    }
}

fn regression_line(sorted: &[Measurement], config: &TrendConfig) -> Option<RegressionLine> {
    let window = &sorted[sorted.len() - config.regression_window(sorted.len())..];
    let fit = velocity_fit(window)?;
    let first = window.first()?;
    let last = window.last()?;
    let span_years = crate::engine::days_between(first.timestamp, last.timestamp) / DAYS_PER_YEAR;

    Some(RegressionLine {
        start: ChartPoint {
            timestamp: first.timestamp,
            total_marker: fit.predict(0.0),
            free_marker: None,
        },
        end: ChartPoint {
            timestamp: last.timestamp,
            total_marker: fit.predict(span_years),
            free_marker: None,
        },
        slope_per_year: fit.slope,
    })
}
