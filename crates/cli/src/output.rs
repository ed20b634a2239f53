//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use trend_lib::{AlertSeverity, Classification, RiskLevel, TrendDirection, TrendResult};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message on stderr, keeping stdout for the report
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Format an optional value with a unit, or a dash
pub fn format_optional(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => format!("{:.*}", precision, v),
        Some(v) => format!("{:.*} {}", precision, v, unit),
        None => "-".to_string(),
    }
}

/// Format a doubling time in days with its month equivalent
pub fn format_doubling(result: &TrendResult) -> String {
    match (result.doubling_time_days, result.doubling_time_months()) {
        (Some(days), Some(months)) => format!("{:.0} days ({:.1} months)", days, months),
        _ => "-".to_string(),
    }
}

/// Color classification
pub fn color_classification(classification: Classification) -> String {
    let text = classification.to_string();
    match classification {
        Classification::Normal => text.green().to_string(),
        Classification::Elevated => text.yellow().to_string(),
        Classification::High => text.red().bold().to_string(),
    }
}

/// Color severity
pub fn color_severity(severity: AlertSeverity) -> String {
    let text = severity.to_string().to_uppercase();
    match severity {
        AlertSeverity::Critical => text.red().bold().to_string(),
        AlertSeverity::Warning => text.yellow().to_string(),
        AlertSeverity::Info => text.blue().to_string(),
    }
}

/// Color risk level
pub fn color_risk(level: RiskLevel) -> String {
    let text = level.to_string();
    match level {
        RiskLevel::Low => text.green().to_string(),
        RiskLevel::Moderate => text.yellow().to_string(),
        RiskLevel::High => text.red().bold().to_string(),
    }
}

/// Color direction
pub fn color_direction(direction: Option<TrendDirection>) -> String {
    match direction {
        Some(d @ (TrendDirection::RisingSignificant | TrendDirection::RisingModerate)) => {
            d.to_string().red().to_string()
        }
        Some(d @ (TrendDirection::DecliningSignificant | TrendDirection::DecliningModerate)) => {
            d.to_string().green().to_string()
        }
        Some(d) => d.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use trend_lib::{compute_trend, Measurement, TrendConfig};

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(2.345), 2, "ng/mL/yr"), "2.35 ng/mL/yr");
        assert_eq!(format_optional(Some(8.0), 1, ""), "8.0");
        assert_eq!(format_optional(None, 2, "ng/mL"), "-");
    }

    #[test]
    fn test_format_doubling() {
        let empty = compute_trend(&[], &TrendConfig::default()).unwrap();
        assert_eq!(format_doubling(&empty), "-");

        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let series = vec![
            Measurement::new(start, 2.0),
            Measurement::new(start + Duration::seconds(31_557_600), 4.0),
        ];
        let doubled = compute_trend(&series, &TrendConfig::default()).unwrap();
        assert_eq!(format_doubling(&doubled), "365 days (12.0 months)");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
