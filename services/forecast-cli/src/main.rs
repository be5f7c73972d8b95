//! Point forecast command-line tool.
//!
//! Queries pre-baked forecast rasters for the nearest grid cell to a
//! latitude/longitude and prints every variable's time series as JSON:
//!
//! ```text
//! forecast-cli query --lat 52.52 --lon 13.40 --pretty
//! forecast-cli --base-url https://example.org/data validate
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use point_forecast::{ForecastConfig, ForecastService, QueryPoint, ResourceSource, SourceSettings};

#[derive(Parser, Debug)]
#[command(name = "forecast-cli")]
#[command(about = "Point forecasts from pre-baked gridded rasters")]
struct Args {
    /// Forecast configuration (YAML); defaults to the built-in DWD preset
    #[arg(long, env = "FORECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Directory with the baked dataset files
    #[arg(long, env = "FORECAST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Base URL of the baked dataset files (takes precedence over --data-dir)
    #[arg(long, env = "FORECAST_BASE_URL")]
    base_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forecast time series at the grid cell nearest to a point
    Query {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Load every grid, raster and timeline and check their shapes
    Validate,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_tracing(args: &Args) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level))
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<ForecastConfig> {
    match &args.config {
        Some(path) => ForecastConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ForecastConfig::dwd_health()),
    }
}

/// Environment settings overridden by command-line flags.
fn source_settings(args: &Args) -> SourceSettings {
    let mut settings = SourceSettings::from_env();
    if let Some(dir) = &args.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(url) = &args.base_url {
        settings.base_url = Some(url.clone());
    }
    settings
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let config = load_config(&args)?;
    let settings = source_settings(&args);
    let source = settings
        .build()
        .context("Failed to open forecast data source")?;

    info!(
        source = %source.describe(),
        grids = config.grids.len(),
        "Starting forecast-cli"
    );

    let service = ForecastService::new(config, source).context("Invalid forecast configuration")?;

    match args.command {
        Command::Query { lat, lon, pretty } => {
            let result = service
                .run_forecast(QueryPoint::new(lat, lon))
                .await
                .with_context(|| format!("No forecast for ({}, {})", lat, lon))?;
            println!("{}", to_json(&result, pretty)?);
        }
        Command::Validate => {
            let summary = service
                .validate_data()
                .await
                .context("Dataset validation failed")?;
            println!("{}", to_json(&summary, true)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWD_CONFIG: &str = include_str!("../config/dwd_health.yaml");

    #[test]
    fn test_bundled_config_matches_preset() {
        let config = ForecastConfig::from_yaml_str(DWD_CONFIG).unwrap();
        assert_eq!(config, ForecastConfig::dwd_health());
    }

    #[test]
    fn test_parse_query_args() {
        let args = Args::try_parse_from([
            "forecast-cli",
            "--data-dir",
            "/srv/baked",
            "query",
            "--lat",
            "-33.9",
            "--lon",
            "18.4",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(args.data_dir, Some(PathBuf::from("/srv/baked")));
        match args.command {
            Command::Query { lat, lon, pretty } => {
                assert_eq!((lat, lon), (-33.9, 18.4));
                assert!(pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_query_requires_coordinates() {
        assert!(Args::try_parse_from(["forecast-cli", "query", "--lat", "52.5"]).is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        let args = Args::try_parse_from([
            "forecast-cli",
            "--data-dir",
            "/srv/baked",
            "--base-url",
            "https://example.org/data",
            "validate",
        ])
        .unwrap();

        let settings = source_settings(&args);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/baked"));
        assert_eq!(settings.base_url.as_deref(), Some("https://example.org/data"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.yaml");
        std::fs::write(&path, DWD_CONFIG).unwrap();

        let args = Args::try_parse_from([
            "forecast-cli",
            "--config",
            path.to_str().unwrap(),
            "validate",
        ])
        .unwrap();
        assert_eq!(load_config(&args).unwrap().grids[0].variables.len(), 3);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }
}
