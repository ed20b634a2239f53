//! PSA Trend CLI
//!
//! A command-line tool for analyzing PSA measurement files locally,
//! through a running trend service, or as chart data.

mod client;
mod commands;
mod config;
mod input;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, chart, remote, ThresholdArgs};
use std::path::PathBuf;
use trend_lib::ChartOptions;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// PSA Trend CLI
#[derive(Parser)]
#[command(name = "psa")]
#[command(author, version, about = "CLI for the PSA Trend & Alert Engine", long_about = None)]
pub struct Cli {
    /// Trend service URL (can also be set via PSA_API_URL env var)
    #[arg(long, env = "PSA_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a measurement file (JSON or CSV) locally
    Analyze {
        /// Measurement file
        file: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Analyze a measurement file through the trend service
    Remote {
        /// Measurement file
        file: PathBuf,

        /// Subject identifier recorded in the service logs
        #[arg(long)]
        subject: Option<String>,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Print the chart projection of a measurement file as JSON
    Chart {
        /// Measurement file
        file: PathBuf,

        /// Chart title
        #[arg(long)]
        title: Option<String>,

        /// Omit the threshold lines
        #[arg(long)]
        no_thresholds: bool,

        /// Omit the regression line
        #[arg(long)]
        no_regression: bool,

        /// Include free PSA values
        #[arg(long)]
        show_free: bool,

        /// Project on the trend service instead of locally
        #[arg(long)]
        remote: bool,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
}

/// Flag or env var first, then the config file, then the local default
fn api_url(flag: Option<String>, file_config: &config::Config) -> String {
    flag.or_else(|| file_config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::Config::load()?;

    let format = cli
        .format
        .or_else(|| {
            file_config
                .default_format
                .as_deref()
                .and_then(|f| f.parse().ok())
        })
        .unwrap_or_default();

    // Execute command
    match cli.command {
        Commands::Analyze { file, thresholds } => {
            let config = thresholds.apply(file_config.trend_config());
            analyze::analyze(&file, &config, format, cli.verbose)?;
        }
        Commands::Remote {
            file,
            subject,
            thresholds,
        } => {
            let client = client::ApiClient::new(&api_url(cli.api_url, &file_config))?;
            let config = thresholds.overrides(file_config.thresholds.clone());
            remote::remote(&client, &file, subject, config, format, cli.verbose).await?;
        }
        Commands::Chart {
            file,
            title,
            no_thresholds,
            no_regression,
            show_free,
            remote,
            thresholds,
        } => {
            let mut options = ChartOptions {
                show_thresholds: !no_thresholds,
                show_regression: !no_regression,
                show_free_marker: show_free,
                ..Default::default()
            };
            if let Some(title) = title {
                options.title = title;
            }
            if remote {
                let client = client::ApiClient::new(&api_url(cli.api_url, &file_config))?;
                let config = thresholds.overrides(file_config.thresholds.clone());
                chart::chart_remote(&client, &file, config, options).await?;
            } else {
                let config = thresholds.apply(file_config.trend_config());
                chart::chart(&file, &config, &options)?;
            }
        }
    }

    Ok(())
}
