//! # Trendscan Core
//!
//! Stage-2 trend, relative strength and breakout screening for equities.
//!
//! ## Overview
//!
//! A scan takes a list of candidate symbols, fetches one benchmark series
//! and then fans out one analysis per candidate:
//!
//! - **Domain models** for symbols, bars and bar series
//! - **Provider contract** ([`MarketDataClient`]) with a Yahoo chart adapter
//!   and an in-memory source
//! - **Indicator engine**: moving averages, trailing extrema, volume
//!   averages and momentum
//! - **Candidate analysis** producing a three-way [`Outcome`]
//! - **Scan orchestration** with bounded concurrency and deadlines
//! - **Watchlist ingestion** for screener CSV exports
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo chart, static) |
//! | [`analyzer`] | Classification rules and the per-candidate analyzer |
//! | [`benchmark`] | Benchmark reference return |
//! | [`data_source`] | Provider trait and request/error types |
//! | [`domain`] | Domain models (Symbol, Bar, BarSeries) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`indicators`] | Pure indicator functions |
//! | [`scan`] | Scan orchestrator, config and report |
//! | [`watchlist`] | CSV watchlist parsing and screening |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trendscan_core::{ScanConfig, ScanOrchestrator, ScanSettings, Symbol, YahooChartClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator =
//!         ScanOrchestrator::new(Arc::new(YahooChartClient::default()), ScanSettings::default())?;
//!
//!     let candidates = vec![Symbol::parse("NVDA")?, Symbol::parse("MSFT")?];
//!     for result in orchestrator.scan(&candidates, &ScanConfig::default()).await? {
//!         println!("{} {} stop {:.2}", result.symbol, result.classification, result.stop_loss);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ ScanOrchestrator │──── BenchmarkContext (once per scan)
//! └────────┬─────────┘
//!          │ fan-out, semaphore-bounded fetches
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ CandidateAnalyzer│────▶│ MarketDataClient │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ indicators       │
//! └──────────────────┘
//! ```

pub mod adapters;
pub mod analyzer;
pub mod benchmark;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod indicators;
pub mod scan;
pub mod watchlist;

pub use adapters::{StaticSource, YahooChartClient};
pub use analyzer::{
    assess, evaluate, AnalysisResult, AnalysisRules, CandidateAnalyzer, Classification,
    IndicatorSnapshot, Outcome, Rejection, UnavailableReason,
};
pub use benchmark::BenchmarkContext;
pub use data_source::{
    HistoryFuture, HistoryRequest, MarketDataClient, SourceError, SourceErrorKind,
};
pub use domain::{Bar, BarSeries, HistoryPeriod, Symbol, UtcDateTime};
pub use error::{ScanError, ValidationError};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use indicators::IndicatorError;
pub use scan::{
    CandidateOutcome, ScanConfig, ScanOrchestrator, ScanReport, ScanSettings, ScanSummary,
    MAX_CANDIDATE_LIMIT, MAX_CONCURRENCY,
};
pub use watchlist::{Watchlist, WatchlistEntry, WatchlistError};
