use thiserror::Error;
use trendscan_core::{ScanError, ValidationError, WatchlistError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Watchlist(WatchlistError::Io { .. }) => 10,
            Self::Watchlist(_) => 2,
            Self::Scan(ScanError::InvalidInput(_)) => 2,
            Self::Scan(ScanError::BenchmarkUnavailable { .. }) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
