use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, MarketDataClient};
use crate::indicators::{momentum_return_percent, IndicatorError};
use crate::{BarSeries, HistoryPeriod, ScanError, Symbol, UtcDateTime};

/// Reference return of the market benchmark, computed once per scan.
///
/// Built before any candidate is dispatched and shared read-only (behind an
/// `Arc`) by every analysis of that scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkContext {
    symbol: Symbol,
    reference_return_percent: f64,
    lookback: usize,
    computed_at: UtcDateTime,
}

impl BenchmarkContext {
    /// Context with a known reference return.
    pub fn new(symbol: Symbol, reference_return_percent: f64, lookback: usize) -> Self {
        Self {
            symbol,
            reference_return_percent,
            lookback,
            computed_at: UtcDateTime::now(),
        }
    }

    /// Computes the trailing `lookback`-session return of `series`.
    pub fn from_series(series: &BarSeries, lookback: usize) -> Result<Self, ScanError> {
        let reference = momentum_return_percent(series.bars(), lookback).map_err(|error| {
            let reason = match error {
                IndicatorError::InsufficientData {
                    required,
                    available,
                } => format!("history too short: need {required} bars, have {available}"),
                IndicatorError::EmptyWindow => error.to_string(),
            };
            ScanError::BenchmarkUnavailable {
                symbol: series.symbol().clone(),
                reason,
            }
        })?;

        Ok(Self::new(series.symbol().clone(), reference, lookback))
    }

    /// Fetches the benchmark history and computes its reference return.
    ///
    /// Any failure is scan-fatal: relative strength cannot be computed for
    /// any candidate without it.
    pub async fn fetch(
        client: &dyn MarketDataClient,
        symbol: &Symbol,
        period: HistoryPeriod,
        lookback: usize,
        timeout: Duration,
    ) -> Result<Self, ScanError> {
        let request = HistoryRequest::new(symbol.clone(), period);
        let series = match tokio::time::timeout(timeout, client.fetch_history(request)).await {
            Ok(Ok(series)) => series,
            Ok(Err(error)) => {
                warn!(benchmark = %symbol, code = error.code(), %error, "benchmark fetch failed");
                return Err(ScanError::BenchmarkUnavailable {
                    symbol: symbol.clone(),
                    reason: error.to_string(),
                });
            }
            Err(_) => {
                warn!(benchmark = %symbol, timeout_ms = timeout.as_millis() as u64, "benchmark fetch timed out");
                return Err(ScanError::BenchmarkUnavailable {
                    symbol: symbol.clone(),
                    reason: format!("fetch exceeded {}ms", timeout.as_millis()),
                });
            }
        };

        let context = Self::from_series(&series, lookback)?;
        debug!(
            benchmark = %symbol,
            bars = series.len(),
            reference_return_percent = context.reference_return_percent,
            "benchmark ready"
        );
        Ok(context)
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn reference_return_percent(&self) -> f64 {
        self.reference_return_percent
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn computed_at(&self) -> UtcDateTime {
        self.computed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticSource;
    use crate::data_source::SourceError;
    use crate::Bar;

    fn series(symbol: &str, closes: &[f64]) -> BarSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(day, &close)| {
                let ts = UtcDateTime::from_unix_timestamp(day as i64 * 86_400).expect("ts");
                Bar::new(ts, close, close, close, close, 1_000).expect("bar")
            })
            .collect();
        BarSeries::new(Symbol::parse(symbol).expect("symbol"), bars).expect("series")
    }

    #[test]
    fn computes_reference_return() {
        let mut closes = vec![400.0];
        closes.extend(std::iter::repeat(410.0).take(59));
        closes.push(440.0);

        let context = BenchmarkContext::from_series(&series("SPY", &closes), 60).expect("ok");
        assert!((context.reference_return_percent() - 10.0).abs() < 1e-9);
        assert_eq!(context.lookback(), 60);
    }

    #[test]
    fn short_history_is_fatal() {
        let closes = vec![100.0; 60];
        let error = BenchmarkContext::from_series(&series("SPY", &closes), 60).expect_err("short");
        assert!(matches!(error, ScanError::BenchmarkUnavailable { .. }));
    }

    #[tokio::test]
    async fn provider_failure_is_fatal() {
        let spy = Symbol::parse("SPY").expect("symbol");
        let source =
            StaticSource::new().with_error(spy.clone(), SourceError::unavailable("maintenance"));

        let error = BenchmarkContext::fetch(
            &source,
            &spy,
            HistoryPeriod::SixMonths,
            60,
            Duration::from_secs(1),
        )
        .await
        .expect_err("must fail");

        assert_eq!(error.code(), "scan.benchmark_unavailable");
        assert!(error.to_string().contains("maintenance"));
    }
}
