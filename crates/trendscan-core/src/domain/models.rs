use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Daily OHLCV bar for one trading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Chronological bar history for one symbol.
///
/// Owned by whoever fetched it and never mutated afterwards; the bars are
/// only reachable through a shared slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: Symbol,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series, rejecting bars whose timestamps are not strictly
    /// increasing.
    pub fn new(symbol: Symbol, bars: Vec<Bar>) -> Result<Self, ValidationError> {
        if let Some(index) = bars
            .windows(2)
            .position(|pair| pair[1].ts <= pair[0].ts)
        {
            return Err(ValidationError::UnorderedBars { index: index + 1 });
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).expect("timestamp")
    }

    #[test]
    fn rejects_invalid_bar_bounds() {
        let err = Bar::new(ts(0), 10.0, 12.0, 9.0, 12.5, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn rejects_non_finite_prices() {
        let err = Bar::new(ts(0), f64::NAN, 12.0, 9.0, 10.0, 10).expect_err("must fail");
        assert!(matches!(err, ValidationError::NonFiniteValue { field: "open" }));
    }

    #[test]
    fn series_rejects_out_of_order_bars() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let first = Bar::new(ts(86_400), 10.0, 11.0, 9.0, 10.5, 100).expect("bar");
        let second = Bar::new(ts(0), 10.0, 11.0, 9.0, 10.5, 100).expect("bar");

        let err = BarSeries::new(symbol, vec![first, second]).expect_err("must fail");
        assert_eq!(err, ValidationError::UnorderedBars { index: 1 });
    }
}
