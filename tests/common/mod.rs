//! Series builders shared by the behavior suites.

#![allow(dead_code)]

use trendscan_core::{Bar, BarSeries, BenchmarkContext, Symbol, UtcDateTime};

pub const BASE_VOLUME: u64 = 1_000_000;

pub fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("test symbol must be valid")
}

pub fn bar(day: usize, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
    let ts = UtcDateTime::from_unix_timestamp(1_600_000_000 + day as i64 * 86_400)
        .expect("test timestamp must be valid");
    Bar::new(ts, open, high, low, close, volume).expect("test bar must be valid")
}

/// Bars whose close climbs `step` per session from `start`, with a tight
/// 0.1 range around each close and constant volume.
pub fn rising_bars(len: usize, start: f64, step: f64) -> Vec<Bar> {
    (0..len)
        .map(|day| {
            let close = start + step * day as f64;
            bar(day, close, close + 0.1, close - 0.1, close, BASE_VOLUME)
        })
        .collect()
}

/// A clean stage-2 uptrend: 250 sessions from 50.0 climbing 0.2 a day.
pub fn uptrend(ticker: &str) -> BarSeries {
    series(ticker, rising_bars(250, 50.0, 0.2))
}

/// The uptrend with the last session printed on `volume`.
pub fn uptrend_with_last_volume(ticker: &str, volume: u64) -> BarSeries {
    let mut bars = rising_bars(250, 50.0, 0.2);
    if let Some(last) = bars.last_mut() {
        last.volume = volume;
    }
    series(ticker, bars)
}

pub fn downtrend(ticker: &str) -> BarSeries {
    series(ticker, rising_bars(250, 150.0, -0.2))
}

/// Flat closes at `close` except the last, which is moved by `return_percent`
/// against the close 60 sessions earlier.
pub fn benchmark_series(ticker: &str, len: usize, close: f64, return_percent: f64) -> BarSeries {
    let last = close * (1.0 + return_percent / 100.0);
    let bars = (0..len)
        .map(|day| {
            let value = if day + 1 == len { last } else { close };
            bar(day, value, value, value, value, BASE_VOLUME)
        })
        .collect();
    series(ticker, bars)
}

pub fn spy(return_percent: f64) -> BarSeries {
    benchmark_series("SPY", 126, 400.0, return_percent)
}

pub fn benchmark(return_percent: f64) -> BenchmarkContext {
    BenchmarkContext::new(symbol("SPY"), return_percent, 60)
}

pub fn series(ticker: &str, bars: Vec<Bar>) -> BarSeries {
    BarSeries::new(symbol(ticker), bars).expect("test bars must be chronological")
}

/// Multiplies every price by `factor`, leaving volumes alone.
pub fn scaled(source: &BarSeries, factor: f64) -> BarSeries {
    let bars = source
        .bars()
        .iter()
        .map(|bar| {
            Bar::new(
                bar.ts,
                bar.open * factor,
                bar.high * factor,
                bar.low * factor,
                bar.close * factor,
                bar.volume,
            )
            .expect("scaled bar must be valid")
        })
        .collect();
    BarSeries::new(source.symbol().clone(), bars).expect("scaled series")
}
