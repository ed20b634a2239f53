//! HTTP API for trend computation, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use trend_lib::{
    parse_series, ChartData, ChartOptions, FollowUpAdvice, RawMeasurement, TrendConfig,
    TrendEngine, TrendError, TrendResult,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: TrendEngine,
    pub version: String,
}

impl AppState {
    pub fn new(engine: TrendEngine, version: impl Into<String>) -> Self {
        Self {
            engine,
            version: version.into(),
        }
    }
}

/// Body of `POST /v1/trend` and `POST /v1/chart`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRequest {
    /// Caller's identifier for the subject, only used for logging
    #[serde(default)]
    pub subject: Option<String>,
    pub measurements: Vec<RawMeasurement>,
    /// Per-request thresholds; the service defaults apply when absent
    #[serde(default)]
    pub config: Option<TrendConfig>,
    #[serde(default)]
    pub options: Option<ChartOptions>,
}

impl TrendRequest {
    fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("anonymous")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    pub result: TrendResult,
    pub advice: FollowUpAdvice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request failures, all answered with an [`ErrorResponse`] body
pub enum ApiError {
    /// Body is not valid JSON or does not match the request shape
    Request(JsonRejection),
    /// Measurements or thresholds rejected by the engine
    Trend(TrendError),
}

impl From<TrendError> for ApiError {
    fn from(err: TrendError) -> Self {
        ApiError::Trend(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Request(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Request(rejection) => (
                rejection.status(),
                ErrorResponse {
                    error: rejection.body_text(),
                    code: Some("invalid_request".to_string()),
                    details: None,
                },
            ),
            ApiError::Trend(err) => {
                let details = match &err {
                    TrendError::InvalidMeasurement { index, .. } => {
                        Some(format!("measurement index {}", index))
                    }
                    TrendError::SeriesTooLong { max, .. } => {
                        Some(format!("maximum length {}", max))
                    }
                    TrendError::InvalidConfig(_) => None,
                };
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: err.to_string(),
                        code: Some(err.code().to_string()),
                        details,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Compute trend metrics, alerts and follow-up advice
async fn compute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrendRequest>, JsonRejection>,
) -> Result<Json<TrendResponse>, ApiError> {
    let Json(request) = payload?;
    let config = request
        .config
        .clone()
        .unwrap_or_else(|| state.engine.config().clone());

    let result = state
        .engine
        .analyze_with(request.subject(), &request.measurements, &config)?;
    let advice = FollowUpAdvice::from_result(&result);

    Ok(Json(TrendResponse { result, advice }))
}

/// Project the series into chart data
async fn chart(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrendRequest>, JsonRejection>,
) -> Result<Json<ChartData>, ApiError> {
    let Json(request) = payload?;
    let config = request
        .config
        .clone()
        .unwrap_or_else(|| state.engine.config().clone());
    let options = request.options.clone().unwrap_or_default();

    let series = parse_series(&request.measurements)?;
    let chart = ChartData::project(&series, &config, &options)?;
    Ok(Json(chart))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/trend", post(compute))
        .route("/v1/chart", post(chart))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
