use thiserror::Error;

use crate::Symbol;

/// Validation and contract errors exposed by `trendscan-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid history period '{value}', expected one of 6mo, 1y, 2y")]
    InvalidPeriod { value: String },

    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,
    #[error("bars must be strictly chronological (violation at index {index})")]
    UnorderedBars { index: usize },

    #[error("candidate limit must be between 1 and {max}, got {value}")]
    InvalidCandidateLimit { value: usize, max: usize },
    #[error("concurrency must be between 1 and {max}, got {value}")]
    InvalidConcurrency { value: usize, max: usize },
    #[error("timeout '{field}' must be greater than zero")]
    ZeroTimeout { field: &'static str },
    #[error("analysis rules are inconsistent: {reason}")]
    InvalidRules { reason: String },
}

/// Scan-level failures. Candidate-level problems never surface here; they
/// are reported per symbol as [`Outcome`](crate::Outcome) values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("invalid scan input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("benchmark '{symbol}' unavailable: {reason}")]
    BenchmarkUnavailable { symbol: Symbol, reason: String },
}

impl ScanError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "scan.invalid_input",
            Self::BenchmarkUnavailable { .. } => "scan.benchmark_unavailable",
        }
    }
}
