//! API client for communicating with the trend service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use trend_lib::{ChartData, ChartOptions, FollowUpAdvice, RawMeasurement, TrendConfig, TrendResult};
use url::Url;

/// API client for the trend service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Compute a trend on the service
    pub async fn trend(&self, request: &TrendRequest) -> Result<TrendResponse> {
        self.post("v1/trend", request).await
    }

    /// Project a chart on the service
    pub async fn chart(&self, request: &TrendRequest) -> Result<ChartData> {
        self.post("v1/chart", request).await
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub measurements: Vec<RawMeasurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TrendConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChartOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    pub result: TrendResult,
    pub advice: FollowUpAdvice,
}
