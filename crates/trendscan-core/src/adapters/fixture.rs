use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::data_source::{HistoryFuture, HistoryRequest, MarketDataClient, SourceError};
use crate::{BarSeries, Symbol};

/// In-memory provider serving scripted histories.
///
/// Symbols without a script resolve to [`SourceError::not_found`]. Every
/// fetch is recorded, and the peak number of overlapping fetches is
/// tracked so callers can observe how wide a scan fanned out.
#[derive(Debug, Default)]
pub struct StaticSource {
    scripts: HashMap<Symbol, Result<BarSeries, SourceError>>,
    delays: HashMap<Symbol, Duration>,
    panics: HashSet<Symbol>,
    default_delay: Option<Duration>,
    fetched: Mutex<Vec<Symbol>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.scripts.insert(series.symbol().clone(), Ok(series));
        self
    }

    pub fn with_error(mut self, symbol: Symbol, error: SourceError) -> Self {
        self.scripts.insert(symbol, Err(error));
        self
    }

    /// Delays every fetch, simulating provider latency.
    pub fn with_latency(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Delays fetches of one symbol, overriding [`Self::with_latency`].
    pub fn with_symbol_latency(mut self, symbol: Symbol, delay: Duration) -> Self {
        self.delays.insert(symbol, delay);
        self
    }

    /// Makes fetches of `symbol` panic instead of returning.
    pub fn with_panic(mut self, symbol: Symbol) -> Self {
        self.panics.insert(symbol);
        self
    }

    /// Symbols fetched so far, in call order.
    pub fn fetched(&self) -> Vec<Symbol> {
        self.fetched
            .lock()
            .map(|fetched| fetched.clone())
            .unwrap_or_default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().map(|fetched| fetched.len()).unwrap_or(0)
    }

    /// Highest number of fetches that were in flight at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self, symbol: &Symbol) {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(symbol.clone());
        }
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
    }
}

/// Decrements the in-flight gauge even when the fetch future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MarketDataClient for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(async move {
            self.enter(&req.symbol);
            let _guard = InFlightGuard(&self.in_flight);

            let delay = self
                .delays
                .get(&req.symbol)
                .copied()
                .or(self.default_delay);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.panics.contains(&req.symbol) {
                panic!("scripted panic for {}", req.symbol);
            }

            match self.scripts.get(&req.symbol) {
                Some(script) => script.clone(),
                None => Err(SourceError::not_found(&req.symbol)),
            }
        })
    }
}
