//! Pure indicator functions over a chronological bar slice.
//!
//! Every function looks at the *tail* of the slice: the last bar is the
//! current session. None of them allocate or touch shared state.

use thiserror::Error;

use crate::Bar;

/// Bars needed before the full indicator set is defined.
pub const FULL_HISTORY_BARS: usize = 200;

/// Indicator input errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("indicator window must be greater than zero")]
    EmptyWindow,
}

/// Which side of the bar range an extremum scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    /// Maximum of `high`.
    HighestHigh,
    /// Minimum of `low`.
    LowestLow,
}

fn require(bars: &[Bar], required: usize) -> Result<(), IndicatorError> {
    if bars.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available: bars.len(),
        });
    }
    Ok(())
}

fn tail(bars: &[Bar], window: usize) -> Result<&[Bar], IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::EmptyWindow);
    }
    require(bars, window)?;
    Ok(&bars[bars.len() - window..])
}

/// Arithmetic mean of the last `window` closes.
pub fn simple_moving_average(bars: &[Bar], window: usize) -> Result<f64, IndicatorError> {
    let tail = tail(bars, window)?;
    Ok(tail.iter().map(|bar| bar.close).sum::<f64>() / window as f64)
}

/// Arithmetic mean of the last `window` volumes, current session included.
pub fn rolling_volume_average(bars: &[Bar], window: usize) -> Result<f64, IndicatorError> {
    let tail = tail(bars, window)?;
    Ok(tail.iter().map(|bar| bar.volume as f64).sum::<f64>() / window as f64)
}

/// Highest high or lowest low over the trailing `window` bars.
///
/// With `exclude_last` the window ends at the bar *before* the current one,
/// giving the prior N-session range a breakout has to clear. The current
/// bar is then never part of the result, even when it is the extreme.
pub fn trailing_extremum(
    bars: &[Bar],
    window: usize,
    kind: Extremum,
    exclude_last: bool,
) -> Result<f64, IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::EmptyWindow);
    }
    let skip = usize::from(exclude_last);
    require(bars, window + skip)?;

    let end = bars.len() - skip;
    let range = &bars[end - window..end];
    let value = match kind {
        Extremum::HighestHigh => range.iter().map(|bar| bar.high).fold(f64::MIN, f64::max),
        Extremum::LowestLow => range.iter().map(|bar| bar.low).fold(f64::MAX, f64::min),
    };
    Ok(value)
}

/// Percentage change from the close `lookback` sessions ago to the
/// current close.
///
/// Needs more than `lookback` bars. A zero reference close yields zero
/// rather than an infinite return.
pub fn momentum_return_percent(bars: &[Bar], lookback: usize) -> Result<f64, IndicatorError> {
    if lookback == 0 {
        return Err(IndicatorError::EmptyWindow);
    }
    require(bars, lookback + 1)?;

    let current = bars[bars.len() - 1].close;
    let reference = bars[bars.len() - 1 - lookback].close;
    if reference == 0.0 {
        return Ok(0.0);
    }
    Ok((current - reference) / reference * 100.0)
}

/// Current volume over its trailing `window` average.
///
/// Returns 0 when the average is zero or undefined.
pub fn relative_volume(bars: &[Bar], window: usize) -> f64 {
    let Some(current) = bars.last() else {
        return 0.0;
    };
    match rolling_volume_average(bars, window) {
        Ok(average) => volume_ratio(current.volume, average),
        Err(_) => 0.0,
    }
}

/// `volume / average`, or 0 when the average is not a positive number.
pub fn volume_ratio(volume: u64, average: f64) -> f64 {
    if average > 0.0 && average.is_finite() {
        volume as f64 / average
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UtcDateTime;

    fn bar(day: i64, low: f64, high: f64, close: f64, volume: u64) -> Bar {
        let ts = UtcDateTime::from_unix_timestamp(day * 86_400).expect("timestamp");
        Bar::new(ts, close, high, low, close, volume).expect("valid bar")
    }

    fn closes(values: &[f64]) -> Vec<Bar> {
        values
            .iter()
            .enumerate()
            .map(|(day, &close)| bar(day as i64, close, close, close, 100))
            .collect()
    }

    #[test]
    fn sma_uses_only_the_tail() {
        let bars = closes(&[100.0, 1.0, 2.0, 3.0]);
        let sma = simple_moving_average(&bars, 3).expect("enough bars");
        assert!((sma - 2.0).abs() < 1e-12);
    }

    #[test]
    fn sma_rejects_short_series() {
        let bars = closes(&[1.0, 2.0]);
        assert_eq!(
            simple_moving_average(&bars, 3),
            Err(IndicatorError::InsufficientData {
                required: 3,
                available: 2
            })
        );
        assert_eq!(
            simple_moving_average(&bars, 0),
            Err(IndicatorError::EmptyWindow)
        );
    }

    #[test]
    fn trailing_high_excludes_current_bar() {
        let bars = vec![
            bar(0, 9.0, 11.0, 10.0, 1),
            bar(1, 9.0, 12.0, 10.0, 1),
            bar(2, 9.0, 50.0, 45.0, 1),
        ];

        let prior = trailing_extremum(&bars, 2, Extremum::HighestHigh, true).expect("enough");
        assert_eq!(prior, 12.0);

        let inclusive = trailing_extremum(&bars, 2, Extremum::HighestHigh, false).expect("enough");
        assert_eq!(inclusive, 50.0);
    }

    #[test]
    fn trailing_low_excludes_current_bar() {
        let bars = vec![
            bar(0, 8.0, 11.0, 10.0, 1),
            bar(1, 9.0, 12.0, 10.0, 1),
            bar(2, 1.0, 12.0, 2.0, 1),
        ];

        let prior = trailing_extremum(&bars, 2, Extremum::LowestLow, true).expect("enough");
        assert_eq!(prior, 8.0);
    }

    #[test]
    fn excluding_the_last_bar_needs_one_more_bar() {
        let bars = closes(&[1.0, 2.0]);
        assert_eq!(
            trailing_extremum(&bars, 2, Extremum::HighestHigh, true),
            Err(IndicatorError::InsufficientData {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn momentum_compares_against_lookback_close() {
        let bars = closes(&[50.0, 80.0, 90.0, 100.0]);
        let change = momentum_return_percent(&bars, 3).expect("enough");
        assert!((change - 100.0).abs() < 1e-12);

        assert!(matches!(
            momentum_return_percent(&bars, 4),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn relative_volume_includes_today_in_average() {
        let bars = vec![
            bar(0, 1.0, 1.0, 1.0, 100),
            bar(1, 1.0, 1.0, 1.0, 100),
            bar(2, 1.0, 1.0, 1.0, 400),
        ];
        assert!((relative_volume(&bars, 3) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn relative_volume_is_zero_when_average_is_undefined() {
        let silent = vec![bar(0, 1.0, 1.0, 1.0, 0), bar(1, 1.0, 1.0, 1.0, 0)];
        assert_eq!(relative_volume(&silent, 2), 0.0);
        assert_eq!(relative_volume(&silent, 5), 0.0);
        assert_eq!(relative_volume(&[], 5), 0.0);
    }
}
