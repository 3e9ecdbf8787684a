//! CLI argument definitions for trendscan.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | Screen a watchlist (or explicit symbols) and print qualifying setups |
//! | `serve` | Run the HTTP API |
//!
//! # Global Options
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--concurrency` | `TRENDSCAN_CONCURRENCY` | `10` |
//! | `--fetch-timeout-ms` | `TRENDSCAN_FETCH_TIMEOUT_MS` | `10000` |
//! | `--scan-timeout-ms` | `TRENDSCAN_SCAN_TIMEOUT_MS` | `60000` |
//! | `--benchmark` | `TRENDSCAN_BENCHMARK` | `SPY` |
//! | `--log-level` | `TRENDSCAN_LOG_LEVEL` | `info` |
//! | `--log-format` | `TRENDSCAN_LOG_FORMAT` | `text` |
//!
//! # Examples
//!
//! ```bash
//! trendscan scan --watchlist nasdaq_screener.csv --min-price 20
//! trendscan scan --symbols NVDA,MSFT,AVGO --format json --pretty
//! trendscan serve --bind 127.0.0.1:8000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Stage-2 trend, relative strength and breakout screener.
#[derive(Debug, Parser)]
#[command(name = "trendscan", author, version, about)]
pub struct Cli {
    /// Maximum number of provider fetches in flight at once (1-64).
    #[arg(long, global = true, env = "TRENDSCAN_CONCURRENCY", default_value_t = 10)]
    pub concurrency: usize,

    /// Timeout for a single history fetch, in milliseconds.
    #[arg(long, global = true, env = "TRENDSCAN_FETCH_TIMEOUT_MS", default_value_t = 10_000)]
    pub fetch_timeout_ms: u64,

    /// Deadline for a whole scan, in milliseconds.
    #[arg(long, global = true, env = "TRENDSCAN_SCAN_TIMEOUT_MS", default_value_t = 60_000)]
    pub scan_timeout_ms: u64,

    /// Benchmark symbol relative strength is measured against.
    #[arg(long, global = true, env = "TRENDSCAN_BENCHMARK", default_value = "SPY")]
    pub benchmark: String,

    /// Base log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[arg(long, global = true, env = "TRENDSCAN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, env = "TRENDSCAN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table for terminal display.
    Table,
    /// JSON using the API field names.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Screen candidates and print the qualifying setups.
    ///
    /// # Examples
    ///
    ///   trendscan scan --watchlist screener.csv
    ///   trendscan scan --symbols NVDA,MSFT --report --format json
    Scan(ScanArgs),

    /// Serve the HTTP API (`GET /`, `POST /scan`).
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// CSV watchlist export (symbol, price and volume columns).
    #[arg(long, required_unless_present = "symbols", conflicts_with = "symbols")]
    pub watchlist: Option<PathBuf>,

    /// Comma-separated symbols to scan directly, skipping the CSV screen.
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub symbols: Vec<String>,

    /// Minimum last price for a watchlist row to become a candidate.
    #[arg(long, default_value_t = 15.0)]
    pub min_price: f64,

    /// Minimum volume for a watchlist row to become a candidate.
    #[arg(long, default_value_t = 200_000)]
    pub min_volume: u64,

    /// Candidates dispatched per scan (1-40); the rest are dropped.
    #[arg(long, default_value_t = 35)]
    pub limit: usize,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Print every candidate outcome and the scan summary, not just results.
    #[arg(long, default_value_t = false)]
    pub report: bool,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = "TRENDSCAN_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,
}
