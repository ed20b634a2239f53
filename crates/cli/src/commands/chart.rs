//! Chart projection output

use anyhow::{Context, Result};
use std::path::Path;
use trend_lib::{parse_series, ChartData, ChartOptions, TrendConfig};

use crate::client::{ApiClient, TrendRequest};
use crate::input::load_measurements;

/// Print the chart projection of a measurement file as JSON
pub fn chart(file: &Path, config: &TrendConfig, options: &ChartOptions) -> Result<()> {
    let raw = load_measurements(file)?;
    let series = parse_series(&raw).context("Invalid measurement series")?;
    let data = ChartData::project(&series, config, options).context("Chart projection failed")?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Print the chart projection computed by the trend service
pub async fn chart_remote(
    client: &ApiClient,
    file: &Path,
    config: Option<TrendConfig>,
    options: ChartOptions,
) -> Result<()> {
    let request = TrendRequest {
        subject: None,
        measurements: load_measurements(file)?,
        config,
        options: Some(options),
    };
    let data = client.chart(&request).await?;

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
