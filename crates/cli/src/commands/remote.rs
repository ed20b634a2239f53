//! Analysis through a running trend service

use anyhow::Result;
use std::path::Path;
use trend_lib::TrendConfig;

use crate::client::{ApiClient, TrendRequest};
use crate::commands::analyze::{render, summarize_raw};
use crate::input::load_measurements;
use crate::output::{print_info, OutputFormat};

/// Send a measurement file to the service and render its answer
pub async fn remote(
    client: &ApiClient,
    file: &Path,
    subject: Option<String>,
    config: Option<TrendConfig>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let measurements = load_measurements(file)?;
    if verbose {
        print_info(&format!(
            "Sending {} measurements from {}",
            measurements.len(),
            file.display()
        ));
    }

    let summary = summarize_raw(&measurements);
    let request = TrendRequest {
        subject,
        measurements,
        config,
        options: None,
    };

    let response = client.trend(&request).await?;
    render(summary, &response.result, &response.advice, format)
}
