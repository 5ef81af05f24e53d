//! Air-quality CLI
//!
//! Local execution entry point. For AWS Lambda, use `airquality-lambda`.

use std::path::PathBuf;

use airquality::{
    error::Result,
    models::{AirQualityResponse, CacheBackend, Config, LoggingConfig},
    pipeline, storage,
};
use clap::{Parser, Subcommand};

/// Air-quality lookups with a TTL cache
#[derive(Parser, Debug)]
#[command(
    name = "airquality",
    version,
    about = "Particulate matter levels for any location"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up air quality for a location
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Print the HTTP response body instead of a status card
        #[arg(long)]
        json: bool,
    },

    /// Remove expired entries from the configured cache
    Sweep,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging. `RUST_LOG` takes precedence, then `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "trace" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Narrow output to `logging.level` unless `RUST_LOG` or `--verbose` chose one.
fn apply_configured_level(verbose: bool, logging: &LoggingConfig) {
    if verbose || std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    match logging.level.parse::<log::LevelFilter>() {
        Ok(level) => log::set_max_level(level),
        Err(_) => {
            log::warn!("Unknown logging.level {:?}, using info", logging.level);
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    apply_configured_level(cli.verbose, &config.logging);
    config.apply_env();
    log::debug!("Configuration: {:?}", config);

    match cli.command {
        Command::Query {
            latitude,
            longitude,
            json,
        } => {
            config.validate()?;
            let result = pipeline::run_query(&config, latitude, longitude).await?;

            if json {
                let body = AirQualityResponse::from(&result);
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", pipeline::render_card(&result));
            }
        }

        Command::Sweep => {
            config.validate()?;
            if config.cache.backend == CacheBackend::Memory {
                log::warn!("The memory cache does not outlive the process; nothing to sweep.");
                return Ok(());
            }

            let store = storage::open(&config.cache).await?;
            let removed = pipeline::run_sweep(store.as_ref()).await;
            log::info!("Removed {} expired entries", removed);
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} cache, ttl {}s, source {})",
                config.cache.backend,
                config.cache.ttl_secs,
                config.fetcher.base_url
            );
        }
    }

    Ok(())
}
