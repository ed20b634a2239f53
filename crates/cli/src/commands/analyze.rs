//! Local trend analysis and report rendering

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;
use trend_lib::{
    compute_trend, parse_series, FollowUpAdvice, Measurement, RawMeasurement, TrendConfig,
    TrendResult,
};

use crate::input::load_measurements;
use crate::output::{
    color_classification, color_direction, color_risk, color_severity, format_doubling,
    format_optional, print_info, print_warning, OutputFormat,
};

/// Row for key/value tables
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Row for alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Overview of the input series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub min_total: f64,
    pub max_total: f64,
}

impl SeriesSummary {
    pub fn from_series(series: &[Measurement]) -> Option<Self> {
        let first = series.iter().map(|m| m.timestamp).min()?;
        let last = series.iter().map(|m| m.timestamp).max()?;
        let min_total = series
            .iter()
            .map(|m| m.total_marker)
            .fold(f64::INFINITY, f64::min);
        let max_total = series
            .iter()
            .map(|m| m.total_marker)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: series.len(),
            first,
            last,
            min_total,
            max_total,
        })
    }
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SeriesSummary>,
    result: &'a TrendResult,
    advice: &'a FollowUpAdvice,
}

/// Analyze a measurement file locally
pub fn analyze(
    file: &Path,
    config: &TrendConfig,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let raw = load_measurements(file)?;
    if verbose {
        print_info(&format!(
            "Loaded {} measurements from {}",
            raw.len(),
            file.display()
        ));
    }

    let series = parse_series(&raw).context("Invalid measurement series")?;
    let result = compute_trend(&series, config).context("Trend computation failed")?;
    let advice = FollowUpAdvice::from_result(&result);

    print_report(&series, &result, &advice, format)
}

/// Summarize raw input for display; unparsable input has no summary
pub fn summarize_raw(raw: &[RawMeasurement]) -> Option<SeriesSummary> {
    parse_series(raw)
        .ok()
        .and_then(|series| SeriesSummary::from_series(&series))
}

/// Render a trend result with its advice
pub fn print_report(
    series: &[Measurement],
    result: &TrendResult,
    advice: &FollowUpAdvice,
    format: OutputFormat,
) -> Result<()> {
    let summary = SeriesSummary::from_series(series);
    render(summary, result, advice, format)
}

pub fn render(
    summary: Option<SeriesSummary>,
    result: &TrendResult,
    advice: &FollowUpAdvice,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let report = Report {
                summary,
                result,
                advice,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            match &summary {
                Some(summary) => {
                    let rows = vec![
                        field("Measurements", summary.count.to_string()),
                        field("First", format_date(&summary.first)),
                        field("Last", format_date(&summary.last)),
                        field("Min total", format!("{:.2} ng/mL", summary.min_total)),
                        field("Max total", format!("{:.2} ng/mL", summary.max_total)),
                        field("Duplicate timestamps", result.duplicate_timestamps.to_string()),
                    ];
                    println!("Series");
                    println!("{}", table(rows));
                }
                None => print_warning("No measurements in series"),
            }

            let rows = vec![
                field("Classification", color_classification(result.classification)),
                field("Latest", format_optional(result.latest_total, 2, "ng/mL")),
                field("Previous", format_optional(result.previous_total, 2, "ng/mL")),
                field("Direction", color_direction(result.direction)),
                field("Free/total ratio", format_optional(result.ratio, 1, "%")),
                field("Velocity", format_optional(result.velocity, 2, "ng/mL/yr")),
                field("Doubling time", format_doubling(result)),
            ];
            println!("\nTrend");
            println!("{}", table(rows));

            if result.alerts.is_empty() {
                println!("\nNo alerts");
            } else {
                let rows: Vec<AlertRow> = result
                    .alerts
                    .iter()
                    .map(|a| AlertRow {
                        severity: color_severity(a.severity),
                        reason: a.reason.to_string(),
                        value: format!("{:.2}", a.triggering_value),
                        description: a.reason.describe().to_string(),
                    })
                    .collect();
                println!("\nAlerts");
                println!("{}", table(rows));
            }

            println!("\nRisk level: {}", color_risk(advice.risk_level));
            for recommendation in &advice.recommendations {
                println!("  • {}", recommendation);
            }
        }
    }

    Ok(())
}

fn field(name: &str, value: String) -> FieldRow {
    FieldRow {
        field: name.to_string(),
        value,
    }
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

fn format_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
