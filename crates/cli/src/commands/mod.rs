//! CLI subcommands

pub mod analyze;
pub mod chart;
pub mod remote;

use clap::Args;
use trend_lib::TrendConfig;

/// Threshold overrides shared by the subcommands
#[derive(Debug, Clone, Default, Args)]
pub struct ThresholdArgs {
    /// Upper bound of the normal range (ng/mL)
    #[arg(long)]
    pub normal_max: Option<f64>,

    /// Lower bound of the high range (ng/mL)
    #[arg(long)]
    pub high_min: Option<f64>,

    /// Free/total ratio percentage below which a risk alert fires
    #[arg(long)]
    pub ratio_risk_min: Option<f64>,

    /// Measurements required before velocity is computed
    #[arg(long)]
    pub min_points: Option<usize>,

    /// Number of most recent measurements used for regression
    #[arg(long)]
    pub window: Option<usize>,

    /// Doubling time (days) below which a rapid-doubling alert fires
    #[arg(long)]
    pub rapid_doubling_days: Option<f64>,

    /// Velocity (ng/mL/yr) above which a velocity alert fires
    #[arg(long)]
    pub velocity_alert_min: Option<f64>,
}

impl ThresholdArgs {
    pub fn is_empty(&self) -> bool {
        self.normal_max.is_none()
            && self.high_min.is_none()
            && self.ratio_risk_min.is_none()
            && self.min_points.is_none()
            && self.window.is_none()
            && self.rapid_doubling_days.is_none()
            && self.velocity_alert_min.is_none()
    }

    /// Apply the flags on top of a base configuration
    pub fn apply(&self, mut config: TrendConfig) -> TrendConfig {
        if let Some(v) = self.normal_max {
            config.normal_max = v;
        }
        if let Some(v) = self.high_min {
            config.high_min = v;
        }
        if let Some(v) = self.ratio_risk_min {
            config.ratio_risk_min = v;
        }
        if let Some(v) = self.min_points {
            config.min_points_for_velocity = v;
        }
        if let Some(v) = self.window {
            config.velocity_window = Some(v);
        }
        if let Some(v) = self.rapid_doubling_days {
            config.rapid_doubling_days = v;
        }
        if let Some(v) = self.velocity_alert_min {
            config.velocity_alert_min = v;
        }
        config
    }

    /// Overrides to send to the service, or `None` to use its defaults
    pub fn overrides(&self, base: Option<TrendConfig>) -> Option<TrendConfig> {
        if self.is_empty() && base.is_none() {
            None
        } else {
            Some(self.apply(base.unwrap_or_default()))
        }
    }
}
