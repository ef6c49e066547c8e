//! CLI entry point for the occupancy rollup.
//!
//! Reads a historical or live sensor snapshot from a file or URL, runs the
//! aggregation engine over it, and prints or writes the resulting JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use occupancy_rollup::{
    config::RollupConfig,
    analyzers::aggregate::warn_sensor_drift,
    fetch::{BasicClient, load_source},
    output::{print_json, print_pretty, write_json},
    readings::{parse_historical, parse_live},
    report::{OccupancyReport, PeakReport},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "occupancy_rollup")]
#[command(about = "Aggregate building occupancy sensor readings", long_about = None)]
struct Cli {
    /// JSON config file (falls back to ROLLUP_CONFIG, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll up a historical (hourly) snapshot
    Historical {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Write the report to this JSON file instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Roll up a live snapshot
    Live {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Write the report to this JSON file instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Reconcile historical peaks against a live snapshot
    Peaks {
        /// Historical snapshot: path to file or URL
        #[arg(long, value_name = "FILE_OR_URL")]
        historical: String,

        /// Live snapshot: path to file or URL
        #[arg(long, value_name = "FILE_OR_URL")]
        live: String,

        /// Write the report to this JSON file instead of logging it
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/occupancy_rollup.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("occupancy_rollup.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.or_else(|| std::env::var("ROLLUP_CONFIG").ok());
    let config = RollupConfig::load_or_default(config_path.as_deref())?;
    let client = BasicClient::new()?;

    match cli.command {
        Commands::Historical { source, output } => {
            let report = historical_report(&client, &source, &config).await?;
            emit(&report, output.as_deref())?;
        }
        Commands::Live { source, output } => {
            let report = live_report(&client, &source, &config).await?;
            emit(&report, output.as_deref())?;
        }
        Commands::Peaks {
            historical,
            live,
            output,
        } => {
            let historical = parse_historical(&load_source(&client, &historical).await?)?;
            let live = parse_live(&load_source(&client, &live).await?)?;
            info!(
                historical = historical.len(),
                live = live.len(),
                drifting = warn_sensor_drift(&historical) + warn_sensor_drift(&live),
                "Reconciling peaks"
            );
            let report = PeakReport::build(&historical, &live, &config);
            emit(&report, output.as_deref())?;
        }
    }

    Ok(())
}

#[tracing::instrument(skip(client, config))]
async fn historical_report(
    client: &BasicClient,
    source: &str,
    config: &RollupConfig,
) -> Result<OccupancyReport> {
    let readings = parse_historical(&load_source(client, source).await?)?;
    info!(
        readings = readings.len(),
        drifting = warn_sensor_drift(&readings),
        "Historical readings loaded"
    );
    Ok(OccupancyReport::build(&readings, config))
}

#[tracing::instrument(skip(client, config))]
async fn live_report(
    client: &BasicClient,
    source: &str,
    config: &RollupConfig,
) -> Result<OccupancyReport> {
    let readings = parse_live(&load_source(client, source).await?)?;
    info!(
        readings = readings.len(),
        drifting = warn_sensor_drift(&readings),
        "Live readings loaded"
    );
    Ok(OccupancyReport::build(&readings, config))
}

/// Writes `value` to `output` when given, otherwise logs it.
fn emit(value: &(impl Serialize + Debug), output: Option<&str>) -> Result<()> {
    print_pretty(value);
    match output {
        Some(path) => {
            write_json(path, value)?;
            info!(path, "Report written");
        }
        None => print_json(value)?,
    }
    Ok(())
}
