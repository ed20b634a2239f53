//! PSA trend library
//!
//! This crate provides the core functionality for:
//! - Validating timestamped PSA measurement series
//! - Trend metrics (free/total ratio, velocity, doubling time)
//! - Threshold classification and prioritized alerts
//! - Follow-up advice and chart projection
//! - Metrics and structured logging

pub mod advice;
pub mod chart;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;

pub use advice::{FollowUpAdvice, RiskLevel};
pub use chart::{ChartData, ChartOptions};
pub use engine::{compute_trend, compute_trend_raw, parse_series, TrendConfig, TrendEngine};
pub use error::{Result, TrendError};
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
