//! Market-data provider contract.
//!
//! The screener treats the provider as a black box: given a symbol and a
//! lookback period it returns a chronological [`BarSeries`] or a
//! [`SourceError`]. Adapters live in [`crate::adapters`].
//!
//! # Example
//!
//! ```rust,ignore
//! use trendscan_core::{HistoryPeriod, HistoryRequest, MarketDataClient, Symbol, YahooChartClient};
//!
//! async fn last_close(client: &YahooChartClient) -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HistoryRequest::new(Symbol::parse("AAPL")?, HistoryPeriod::OneYear);
//!     let series = client.fetch_history(request).await?;
//!     if let Some(bar) = series.last() {
//!         println!("AAPL close: {:.2}", bar.close);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{BarSeries, HistoryPeriod, Symbol};

/// Boxed future returned by [`MarketDataClient::fetch_history`].
pub type HistoryFuture<'a> = Pin<Box<dyn Future<Output = Result<BarSeries, SourceError>> + Send + 'a>>;

/// Provider error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    NotFound,
    Unavailable,
    Timeout,
    RateLimited,
    Malformed,
}

/// Structured provider error.
///
/// `retryable` is informational; the screener never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: format!("symbol '{symbol}' is not known to the provider"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for a history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub period: HistoryPeriod,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, period: HistoryPeriod) -> Self {
        Self { symbol, period }
    }
}

/// Market-data provider contract.
///
/// Implementations must return bars in chronological order (enforced by
/// [`BarSeries::new`]) and must be `Send + Sync`: one client is shared by
/// every concurrent candidate fetch of a scan.
pub trait MarketDataClient: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetches daily OHLCV history for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the symbol is unknown, the provider is
    /// unreachable or slow, or the payload cannot be decoded into bars.
    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a>;
}
