//! Observability infrastructure for the trend engine
//!
//! Provides:
//! - Prometheus metrics (computations, rejected inputs, alerts by severity, latency)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::TrendError;
use crate::models::{Alert, AlertSeverity, TrendResult};

/// Histogram buckets for compute latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Histogram buckets for series length
const SERIES_LENGTH_BUCKETS: &[f64] = &[1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 500.0, 1000.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    computations: IntCounter,
    invalid_inputs: IntCounter,
    alerts: IntCounterVec,
    series_length: Histogram,
    compute_latency_seconds: Histogram,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            computations: register_int_counter!(
                "psa_trend_computations_total",
                "Total number of successful trend computations"
            )
            .expect("Failed to register computations"),

            invalid_inputs: register_int_counter!(
                "psa_trend_invalid_inputs_total",
                "Total number of series rejected by validation"
            )
            .expect("Failed to register invalid_inputs"),

            alerts: register_int_counter_vec!(
                "psa_trend_alerts_total",
                "Total number of alerts raised, by severity",
                &["severity"]
            )
            .expect("Failed to register alerts"),

            series_length: register_histogram!(
                "psa_trend_series_length",
                "Number of measurements per analyzed series",
                SERIES_LENGTH_BUCKETS.to_vec()
            )
            .expect("Failed to register series_length"),

            compute_latency_seconds: register_histogram!(
                "psa_trend_compute_latency_seconds",
                "Time spent computing a trend result",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register compute_latency_seconds"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_computations(&self) {
        self.inner().computations.inc();
    }

    pub fn inc_invalid_inputs(&self) {
        self.inner().invalid_inputs.inc();
    }

    pub fn inc_alert(&self, severity: AlertSeverity) {
        self.inner()
            .alerts
            .with_label_values(&[&severity.to_string()])
            .inc();
    }

    pub fn observe_series_length(&self, len: usize) {
        self.inner().series_length.observe(len as f64);
    }

    pub fn observe_compute_latency(&self, duration_secs: f64) {
        self.inner().compute_latency_seconds.observe(duration_secs);
    }
}

/// Structured logger for engine and service events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a completed trend computation
    pub fn log_trend(&self, subject: &str, result: &TrendResult) {
        info!(
            event = "trend_computed",
            instance = %self.instance,
            subject = %subject,
            measurements = result.measurement_count,
            classification = %result.classification,
            velocity = ?result.velocity,
            doubling_time_days = ?result.doubling_time_days,
            ratio = ?result.ratio,
            alerts = result.alerts.len(),
            "Computed PSA trend"
        );
    }

    /// Log a single alert; critical ones at warn level
    pub fn log_alert(&self, subject: &str, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Critical => {
                warn!(
                    event = "alert_raised",
                    instance = %self.instance,
                    subject = %subject,
                    severity = %alert.severity,
                    reason = %alert.reason,
                    triggering_value = alert.triggering_value,
                    "Critical PSA alert"
                );
            }
            _ => {
                info!(
                    event = "alert_raised",
                    instance = %self.instance,
                    subject = %subject,
                    severity = %alert.severity,
                    reason = %alert.reason,
                    triggering_value = alert.triggering_value,
                    "PSA alert"
                );
            }
        }
    }

    /// Log a series rejected by validation
    pub fn log_rejected(&self, subject: &str, error: &TrendError) {
        warn!(
            event = "invalid_measurement",
            instance = %self.instance,
            subject = %subject,
            code = error.code(),
            error = %error,
            "Rejected measurement series"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            addr = %addr,
            "Trend service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Trend service shutting down"
        );
    }
}
