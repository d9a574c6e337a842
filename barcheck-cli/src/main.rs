//! Barcheck CLI — run data health checks over OHLCV + factor datasets.
//!
//! Commands:
//! - `missing-data` — null counts in the OHLCV columns
//! - `large-steps` — period-over-period jumps above threshold
//! - `required-columns` — absent OHLCV columns
//! - `missing-factor` — absent or empty adjustment factor
//! - `all` — every check, with a combined summary
//!
//! Exit status: 0 when every check passed, 1 when any finding was reported,
//! 2 when no instruments were loaded.

use anyhow::{Context, Result};
use barcheck_core::checks::{CheckEngine, CheckKind, CheckReport, HealthStatus};
use barcheck_core::config::HealthCheckConfig;
use barcheck_core::data::{BinDirProvider, MarketFallback, SeriesStore};
use barcheck_core::report::Reporter;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "barcheck",
    about = "Barcheck — data health checks for OHLCV and adjustment-factor series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory of per-instrument CSV / Parquet files.
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    /// Root of a binary provider dump (calendars/, instruments/, features/).
    #[arg(long, global = true)]
    provider_dir: Option<PathBuf>,

    /// TOML config file. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider frequency (e.g. day, 1min).
    #[arg(long, global = true)]
    freq: Option<String>,

    /// Max absolute change for open/high/low/close (0.5 = 50%).
    #[arg(long, global = true)]
    price_threshold: Option<f64>,

    /// Max absolute change for volume (3 = 300%).
    #[arg(long, global = true)]
    volume_threshold: Option<f64>,

    /// Nulls tolerated per column before a series is flagged.
    #[arg(long, global = true)]
    missing_tolerance: Option<usize>,

    /// Identifier exempt from the factor check. Repeat to list several;
    /// replaces the configured list.
    #[arg(long = "exempt", global = true)]
    exempt: Vec<String>,

    /// Clear the factor exemption list so every instrument is checked.
    #[arg(long, default_value_t = false, global = true, conflicts_with = "exempt")]
    no_exempt: bool,

    /// Market to try when resolving the provider universe. Repeat to give
    /// the fallback order; replaces the configured chain.
    #[arg(long = "market", global = true)]
    market: Vec<String>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Load instruments and run checks on one thread.
    #[arg(long, default_value_t = false, global = true)]
    sequential: bool,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Commands {
    /// Check for null values in the OHLCV columns.
    MissingData,
    /// Check for large period-over-period changes in the OHLCV columns.
    LargeSteps,
    /// Check that every series has all OHLCV columns.
    RequiredColumns,
    /// Check that the factor column exists and is not empty.
    MissingFactor,
    /// Run every check.
    All,
}

impl Commands {
    fn kind(self) -> Option<CheckKind> {
        match self {
            Commands::MissingData => Some(CheckKind::MissingData),
            Commands::LargeSteps => Some(CheckKind::LargeStepChange),
            Commands::RequiredColumns => Some(CheckKind::MissingRequiredColumn),
            Commands::MissingFactor => Some(CheckKind::MissingFactor),
            Commands::All => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = resolve_config(&cli)?;
    let store = build_store(&cli, &config)?;
    let engine = CheckEngine::new(&config).with_parallelism(!cli.sequential);

    let report = match cli.command.kind() {
        Some(kind) => CheckReport::new(store.len(), vec![engine.run(kind, &store)]),
        None => engine.run_all(&store),
    };

    match cli.format {
        Format::Text => print!("{}", Reporter.render_text(&report)),
        Format::Json => println!("{}", Reporter.render_json(&report)?),
    }

    Ok(ExitCode::from(exit_status(report.status())))
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barcheck=info,barcheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config file (or defaults), then flag overrides, then validation.
fn resolve_config(cli: &Cli) -> Result<HealthCheckConfig> {
    let mut config = match &cli.config {
        Some(path) => HealthCheckConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HealthCheckConfig::default(),
    };

    if let Some(freq) = &cli.freq {
        config.frequency = freq.clone();
    }
    if let Some(t) = cli.price_threshold {
        config.price_change_threshold = t;
    }
    if let Some(t) = cli.volume_threshold {
        config.volume_change_threshold = t;
    }
    if let Some(n) = cli.missing_tolerance {
        config.missing_data_tolerance = n;
    }
    if cli.no_exempt {
        config.factor_exempt_instruments.clear();
    } else if !cli.exempt.is_empty() {
        config.factor_exempt_instruments = cli.exempt.clone();
    }
    if !cli.market.is_empty() {
        config.markets = cli.market.clone();
    }

    config.validate()?;
    Ok(config)
}

fn build_store(cli: &Cli, config: &HealthCheckConfig) -> Result<SeriesStore> {
    let mut builder = SeriesStore::builder()
        .frequency(config.frequency.clone())
        .markets(MarketFallback::new(config.markets.iter().cloned()))
        .parallel(!cli.sequential);

    // The builder rejects both or neither source.
    if let Some(dir) = &cli.csv_dir {
        builder = builder.directory(dir);
    }
    if let Some(root) = &cli.provider_dir {
        builder = builder.provider(Box::new(BinDirProvider::new(root)));
    }

    let store = builder.build()?;
    if let Some(market) = store.market() {
        info!(market, instruments = store.len(), "universe loaded");
    }
    Ok(store)
}

fn exit_status(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Passed => 0,
        HealthStatus::Failed => 1,
        HealthStatus::NoData => 2,
    }
}
