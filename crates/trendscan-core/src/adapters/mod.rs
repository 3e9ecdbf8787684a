//! Provider adapters implementing [`MarketDataClient`](crate::MarketDataClient).
//!
//! | Adapter | Description |
//! |---------|-------------|
//! | [`YahooChartClient`] | Yahoo Finance v8 chart endpoint over HTTP |
//! | [`StaticSource`] | Scripted in-memory histories for tests and offline runs |

mod fixture;
mod yahoo;

pub use fixture::StaticSource;
pub use yahoo::YahooChartClient;
