//! # Domain Models
//!
//! Canonical domain types for screening market data.
//!
//! All models validate their invariants at construction time, so a
//! [`BarSeries`] that reaches the indicator code is always chronological
//! and every [`Bar`] in it has finite, non-negative prices with
//! `low <= open, close <= high`.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bar`] | Daily OHLCV bar |
//! | [`BarSeries`] | Chronological bars for one symbol |
//! | [`HistoryPeriod`] | Lookback requested from a provider (6mo, 1y, 2y) |
//! | [`Symbol`] | Validated ticker |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod period;
mod symbol;
mod timestamp;

pub use models::{Bar, BarSeries};
pub use period::HistoryPeriod;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
