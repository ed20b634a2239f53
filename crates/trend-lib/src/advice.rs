//! Follow-up advice derived from a trend result
//!
//! Maps the computed trend onto a coarse risk level and the follow-up steps
//! the care team uses for that level. Delivery of the advice (SMS, email) is
//! left to the notification dispatcher.

use serde::{Deserialize, Serialize};

use crate::models::{AlertReason, Classification, TrendResult};

/// Doubling within 3 months needs urgent intervention
const URGENT_DOUBLING_MONTHS: f64 = 3.0;

/// Doubling within 6 months is high risk
const HIGH_RISK_DOUBLING_MONTHS: f64 = 6.0;

/// Doubling within 12 months needs close monitoring
const MODERATE_RISK_DOUBLING_MONTHS: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpAdvice {
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl FollowUpAdvice {
    pub fn from_result(result: &TrendResult) -> Self {
        let doubling_months = result.doubling_time_months();
        let risk_level = risk_level(result, doubling_months);

        let mut recommendations: Vec<String> = match risk_level {
            RiskLevel::High => vec![
                "Schedule a follow-up visit within 2-4 weeks",
                "Consider PSMA-PET or MRI imaging",
                "Refer for oncology consultation",
                "Evaluate treatment intervention",
            ],
            RiskLevel::Moderate => vec![
                "Schedule a follow-up visit within 4-6 weeks",
                "Repeat PSA test in 1 month",
                "Consider imaging",
                "Monitor closely",
            ],
            RiskLevel::Low => vec![
                "Continue routine PSA monitoring",
                "Keep the scheduled follow-up",
                "Maintain a healthy lifestyle",
            ],
        }
        .into_iter()
        .map(String::from)
        .collect();

        if doubling_months.is_some_and(|m| m < URGENT_DOUBLING_MONTHS) {
            recommendations.push("PSA rising very rapidly: urgent intervention needed".to_string());
        }

        Self {
            risk_level,
            recommendations,
        }
    }

    /// Whether the patient and care team should be notified
    pub fn should_notify(&self) -> bool {
        self.risk_level >= RiskLevel::Moderate
    }
}

fn risk_level(result: &TrendResult, doubling_months: Option<f64>) -> RiskLevel {
    if result.classification == Classification::High
        || doubling_months.is_some_and(|m| m < HIGH_RISK_DOUBLING_MONTHS)
    {
        return RiskLevel::High;
    }

    if result.classification == Classification::Elevated
        || doubling_months.is_some_and(|m| m < MODERATE_RISK_DOUBLING_MONTHS)
        || result.has_alert(AlertReason::HighVelocity)
    {
        return RiskLevel::Moderate;
    }

    RiskLevel::Low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DAYS_PER_MONTH;
    use crate::models::{Alert, AlertSeverity};

    fn result(classification: Classification) -> TrendResult {
        TrendResult {
            ratio: None,
            velocity: None,
            doubling_time_days: None,
            classification,
            alerts: Vec::new(),
            latest_total: Some(1.0),
            previous_total: None,
            direction: None,
            measurement_count: 3,
            duplicate_timestamps: 0,
        }
    }

    #[test]
    fn test_low_risk_no_notification() {
        let advice = FollowUpAdvice::from_result(&result(Classification::Normal));
        assert_eq!(advice.risk_level, RiskLevel::Low);
        assert_eq!(advice.recommendations.len(), 3);
        assert!(!advice.should_notify());
    }

    #[test]
    fn test_elevated_is_moderate() {
        let advice = FollowUpAdvice::from_result(&result(Classification::Elevated));
        assert_eq!(advice.risk_level, RiskLevel::Moderate);
        assert!(advice.should_notify());
    }

    #[test]
    fn test_high_classification_is_high() {
        let advice = FollowUpAdvice::from_result(&result(Classification::High));
        assert_eq!(advice.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_doubling_time_drives_risk() {
        let mut r = result(Classification::Normal);
        r.doubling_time_days = Some(10.0 * DAYS_PER_MONTH);
        assert_eq!(FollowUpAdvice::from_result(&r).risk_level, RiskLevel::Moderate);

        r.doubling_time_days = Some(4.0 * DAYS_PER_MONTH);
        assert_eq!(FollowUpAdvice::from_result(&r).risk_level, RiskLevel::High);

        r.doubling_time_days = Some(2.0 * DAYS_PER_MONTH);
        let advice = FollowUpAdvice::from_result(&r);
        assert_eq!(advice.risk_level, RiskLevel::High);
        assert!(advice.recommendations.last().unwrap().contains("urgent"));
    }

    #[test]
    fn test_velocity_alert_is_moderate() {
        let mut r = result(Classification::Normal);
        r.alerts.push(Alert::new(
            AlertSeverity::Warning,
            AlertReason::HighVelocity,
            2.5,
        ));
        assert_eq!(FollowUpAdvice::from_result(&r).risk_level, RiskLevel::Moderate);
    }
}
