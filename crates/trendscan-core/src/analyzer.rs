//! Per-candidate analysis: fetch, indicators, stage-2 classification.
//!
//! [`evaluate`] and [`assess`] are pure; [`CandidateAnalyzer::analyze`]
//! adds the provider fetch in front of them. Every path ends in exactly
//! one [`Outcome`].

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::data_source::{HistoryRequest, MarketDataClient, SourceError, SourceErrorKind};
use crate::indicators::{
    momentum_return_percent, rolling_volume_average, simple_moving_average, trailing_extremum,
    volume_ratio, Extremum, IndicatorError, FULL_HISTORY_BARS,
};
use crate::{Bar, BarSeries, BenchmarkContext, HistoryPeriod, Symbol, ValidationError};

const QUOTE_LINK_BASE: &str = "https://finviz.com/quote.ashx?t=";

// ============================================================================
// Rules
// ============================================================================

/// Numeric thresholds of the stage-2 / breakout rule set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRules {
    /// Fewer bars than this is "not qualified", not an error.
    pub min_history_bars: usize,
    pub medium_sma_window: usize,
    pub long_sma_window: usize,
    /// Price must be at least this fraction of the trailing year high.
    pub year_high_ratio: f64,
    /// Prior-range window a breakout has to clear (current bar excluded).
    pub breakout_window: usize,
    pub volume_window: usize,
    /// Relative volume a breakout has to exceed.
    pub breakout_relative_volume: f64,
    /// Multiplier applied to the prior-range low for the stop.
    pub stop_loss_factor: f64,
    /// Sessions used for both the candidate and the benchmark return.
    pub rs_lookback: usize,
}

impl Default for AnalysisRules {
    fn default() -> Self {
        Self {
            min_history_bars: FULL_HISTORY_BARS,
            medium_sma_window: 150,
            long_sma_window: 200,
            year_high_ratio: 0.80,
            breakout_window: 20,
            volume_window: 50,
            breakout_relative_volume: 1.5,
            stop_loss_factor: 0.98,
            rs_lookback: 60,
        }
    }
}

impl AnalysisRules {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let windows = [
            ("medium_sma_window", self.medium_sma_window),
            ("long_sma_window", self.long_sma_window),
            ("breakout_window", self.breakout_window),
            ("volume_window", self.volume_window),
            ("rs_lookback", self.rs_lookback),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, window)| *window == 0) {
            return Err(ValidationError::InvalidRules {
                reason: format!("{name} must be greater than zero"),
            });
        }

        let required = self
            .medium_sma_window
            .max(self.long_sma_window)
            .max(self.volume_window)
            .max(self.breakout_window + 1)
            .max(self.rs_lookback + 1);
        if self.min_history_bars < required {
            return Err(ValidationError::InvalidRules {
                reason: format!(
                    "min_history_bars {} is below the {} bars the indicators need",
                    self.min_history_bars, required
                ),
            });
        }

        let ratios = [
            ("year_high_ratio", self.year_high_ratio),
            ("breakout_relative_volume", self.breakout_relative_volume),
            ("stop_loss_factor", self.stop_loss_factor),
        ];
        if let Some((name, value)) = ratios
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(ValidationError::InvalidRules {
                reason: format!("{name} must be finite and non-negative, got {value}"),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Outcome types
// ============================================================================

/// Setup class of a qualifying candidate. Both classes qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "💎 ROTURA PURA")]
    Breakout,
    #[serde(rename = "✅ Calidad")]
    Quality,
}

impl Classification {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Breakout => "💎 ROTURA PURA",
            Self::Quality => "✅ Calidad",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A qualifying candidate, numeric fields rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "Symbol")]
    pub symbol: Symbol,
    #[serde(rename = "Precio")]
    pub price: f64,
    #[serde(rename = "Stop_Loss")]
    pub stop_loss: f64,
    #[serde(rename = "Vol_Relativo")]
    pub relative_volume: f64,
    #[serde(rename = "RS_Rating")]
    pub rs_rating: f64,
    #[serde(rename = "Estado")]
    pub classification: Classification,
    #[serde(rename = "Link")]
    pub link: String,
}

impl AnalysisResult {
    pub fn new(
        symbol: Symbol,
        price: f64,
        stop_loss: f64,
        relative_volume: f64,
        rs_rating: f64,
        classification: Classification,
    ) -> Self {
        let link = quote_link(&symbol);
        Self {
            symbol,
            price: round2(price),
            stop_loss: round2(stop_loss),
            relative_volume: round2(relative_volume),
            rs_rating: round2(rs_rating),
            classification,
            link,
        }
    }
}

/// Why a candidate did not qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    InsufficientHistory { bars: usize },
    TrendTemplate,
    FarFromYearHigh,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientHistory { bars } => write!(f, "insufficient history ({bars} bars)"),
            Self::TrendTemplate => {
                f.write_str("price is not above the medium average above the long average")
            }
            Self::FarFromYearHigh => f.write_str("price is too far below the year high"),
        }
    }
}

/// Why a candidate could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum UnavailableReason {
    Timeout,
    NotFound,
    Provider(String),
    Malformed(String),
    Panicked(String),
    ScanDeadline,
}

impl Display for UnavailableReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => f.write_str("provider fetch timed out"),
            Self::NotFound => f.write_str("symbol not found"),
            Self::Provider(message) => write!(f, "provider error: {message}"),
            Self::Malformed(message) => write!(f, "malformed data: {message}"),
            Self::Panicked(message) => write!(f, "analysis panicked: {message}"),
            Self::ScanDeadline => f.write_str("scan deadline elapsed before completion"),
        }
    }
}

impl From<SourceError> for UnavailableReason {
    fn from(error: SourceError) -> Self {
        match error.kind() {
            SourceErrorKind::Timeout => Self::Timeout,
            SourceErrorKind::NotFound => Self::NotFound,
            SourceErrorKind::Malformed => Self::Malformed(error.message().to_owned()),
            _ => Self::Provider(error.to_string()),
        }
    }
}

/// Result of one candidate analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Qualified(AnalysisResult),
    NotQualified(Rejection),
    Unavailable(UnavailableReason),
}

impl Outcome {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Qualified(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            Self::Qualified(result) => Some(result),
            _ => None,
        }
    }
}

// ============================================================================
// Pure evaluation
// ============================================================================

/// Indicator values the classification rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub medium_sma: f64,
    pub long_sma: f64,
    /// Highest high of the prior breakout window, current bar excluded.
    pub prior_high: f64,
    /// Lowest low of the prior breakout window, current bar excluded.
    pub prior_low: f64,
    pub volume: u64,
    pub volume_average: f64,
    /// Highest high over the whole series.
    pub year_high: f64,
    pub momentum_percent: f64,
}

impl IndicatorSnapshot {
    pub fn compute(bars: &[Bar], rules: &AnalysisRules) -> Result<Self, IndicatorError> {
        let current = bars.last().ok_or(IndicatorError::InsufficientData {
            required: 1,
            available: 0,
        })?;

        Ok(Self {
            price: current.close,
            medium_sma: simple_moving_average(bars, rules.medium_sma_window)?,
            long_sma: simple_moving_average(bars, rules.long_sma_window)?,
            prior_high: trailing_extremum(bars, rules.breakout_window, Extremum::HighestHigh, true)?,
            prior_low: trailing_extremum(bars, rules.breakout_window, Extremum::LowestLow, true)?,
            volume: current.volume,
            volume_average: rolling_volume_average(bars, rules.volume_window)?,
            year_high: trailing_extremum(bars, bars.len(), Extremum::HighestHigh, false)?,
            momentum_percent: momentum_return_percent(bars, rules.rs_lookback)?,
        })
    }

    pub fn relative_volume(&self) -> f64 {
        volume_ratio(self.volume, self.volume_average)
    }

    fn is_finite(&self) -> bool {
        [
            self.price,
            self.medium_sma,
            self.long_sma,
            self.prior_high,
            self.prior_low,
            self.volume_average,
            self.year_high,
            self.momentum_percent,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Applies the classification rules to precomputed indicators.
pub fn assess(
    symbol: &Symbol,
    snapshot: &IndicatorSnapshot,
    benchmark: &BenchmarkContext,
    rules: &AnalysisRules,
) -> Outcome {
    if !snapshot.is_finite() || !benchmark.reference_return_percent().is_finite() {
        return Outcome::Unavailable(UnavailableReason::Malformed(String::from(
            "indicator produced a non-finite value",
        )));
    }

    let price = snapshot.price;
    if !(price > snapshot.medium_sma && snapshot.medium_sma > snapshot.long_sma) {
        return Outcome::NotQualified(Rejection::TrendTemplate);
    }
    if price < rules.year_high_ratio * snapshot.year_high {
        return Outcome::NotQualified(Rejection::FarFromYearHigh);
    }

    let rs_rating = snapshot.momentum_percent - benchmark.reference_return_percent();
    let relative_volume = snapshot.relative_volume();
    let classification =
        if relative_volume > rules.breakout_relative_volume && price > snapshot.prior_high {
            Classification::Breakout
        } else {
            Classification::Quality
        };
    let stop_loss = snapshot.prior_low * rules.stop_loss_factor;

    Outcome::Qualified(AnalysisResult::new(
        symbol.clone(),
        price,
        stop_loss,
        relative_volume,
        rs_rating,
        classification,
    ))
}

/// Classifies a fetched series. Short histories never reach indicator math.
pub fn evaluate(series: &BarSeries, benchmark: &BenchmarkContext, rules: &AnalysisRules) -> Outcome {
    let bars = series.bars();
    if bars.len() < rules.min_history_bars {
        return Outcome::NotQualified(Rejection::InsufficientHistory { bars: bars.len() });
    }

    match IndicatorSnapshot::compute(bars, rules) {
        Ok(snapshot) => assess(series.symbol(), &snapshot, benchmark, rules),
        Err(_) => Outcome::NotQualified(Rejection::InsufficientHistory { bars: bars.len() }),
    }
}

// ============================================================================
// Candidate analyzer
// ============================================================================

/// Fetches and classifies one candidate at a time.
///
/// Cheap to clone: one instance is built per scan and cloned into every
/// candidate task. The shared semaphore bounds in-flight provider fetches
/// only; classification runs outside it.
#[derive(Clone)]
pub struct CandidateAnalyzer {
    client: Arc<dyn MarketDataClient>,
    fetch_limiter: Arc<Semaphore>,
    period: HistoryPeriod,
    fetch_timeout: Duration,
    rules: AnalysisRules,
}

impl CandidateAnalyzer {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        fetch_limiter: Arc<Semaphore>,
        period: HistoryPeriod,
        fetch_timeout: Duration,
        rules: AnalysisRules,
    ) -> Self {
        Self {
            client,
            fetch_limiter,
            period,
            fetch_timeout,
            rules,
        }
    }

    pub async fn analyze(&self, symbol: &Symbol, benchmark: &BenchmarkContext) -> Outcome {
        match self.fetch(symbol).await {
            Ok(series) => evaluate(&series, benchmark, &self.rules),
            Err(reason) => Outcome::Unavailable(reason),
        }
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<BarSeries, UnavailableReason> {
        let _permit = self
            .fetch_limiter
            .acquire()
            .await
            .map_err(|_| UnavailableReason::Provider(String::from("fetch limiter closed")))?;

        let request = HistoryRequest::new(symbol.clone(), self.period);
        match tokio::time::timeout(self.fetch_timeout, self.client.fetch_history(request)).await {
            Ok(Ok(series)) => Ok(series),
            Ok(Err(error)) => Err(error.into()),
            Err(_) => Err(UnavailableReason::Timeout),
        }
    }
}

fn quote_link(symbol: &Symbol) -> String {
    format!("{QUOTE_LINK_BASE}{}", urlencoding::encode(symbol.as_str()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
