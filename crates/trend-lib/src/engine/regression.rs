//! Ordinary least-squares fitting
//!
//! Velocity uses a linear fit of total PSA against years; doubling time uses
//! a log-linear fit of ln(PSA) against days.

use chrono::{DateTime, Utc};

use crate::models::Measurement;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days per year used for velocity (Julian year)
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Result of a least-squares line fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, 0.0 when y is constant
    pub r_squared: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope * x + intercept`
///
/// Returns `None` with fewer than two points or when every x is equal.
pub fn fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    // Centered sums keep precision when x is large
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx.abs() < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let r_squared = if syy.abs() < f64::EPSILON {
        0.0
    } else {
        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
            .sum();
        1.0 - ss_res / syy
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Fractional days between two instants
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to.signed_duration_since(from);
    delta.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Total PSA against years since the first sample; slope is ng/mL/year
pub fn velocity_fit(samples: &[Measurement]) -> Option<LinearFit> {
    let t0 = samples.first()?.timestamp;
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|m| (days_between(t0, m.timestamp) / DAYS_PER_YEAR, m.total_marker))
        .collect();
    fit(&points)
}

/// ln(total PSA) against days since the first sample, positive values only
///
/// The slope is the continuous growth rate per day.
pub fn log_growth_fit(samples: &[Measurement]) -> Option<LinearFit> {
    let positive: Vec<&Measurement> = samples.iter().filter(|m| m.total_marker > 0.0).collect();
    let t0 = positive.first()?.timestamp;
    let points: Vec<(f64, f64)> = positive
        .iter()
        .map(|m| (days_between(t0, m.timestamp), m.total_marker.ln()))
        .collect();
    fit(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_fit_exact_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 3.0 * i as f64 + 1.0)).collect();
        let fit = fit(&points).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!((fit.predict(20.0) - 61.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_needs_spread_in_x() {
        assert!(fit(&[(1.0, 2.0)]).is_none());
        assert!(fit(&[(1.0, 2.0), (1.0, 5.0)]).is_none());
    }

    #[test]
    fn test_flat_series_has_zero_slope() {
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 7.0)).collect();
        let fit = fit(&points).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn test_days_between_fractional() {
        let a = t0();
        let b = a + Duration::hours(36);
        assert!((days_between(a, b) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_per_year() {
        let samples = vec![
            Measurement::new(t0(), 1.0),
            Measurement::new(t0() + Duration::days(730), 3.0),
        ];
        let fit = velocity_fit(&samples).unwrap();
        // 2 ng/mL over 730 days
        assert!((fit.slope - 2.0 * DAYS_PER_YEAR / 730.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_growth_skips_zero_values() {
        let samples = vec![
            Measurement::new(t0(), 0.0),
            Measurement::new(t0() + Duration::days(10), 1.0),
            Measurement::new(t0() + Duration::days(110), 2.0),
        ];
        let fit = log_growth_fit(&samples).unwrap();
        let doubling = std::f64::consts::LN_2 / fit.slope;
        assert!((doubling - 100.0).abs() < 1e-9);
    }
}
