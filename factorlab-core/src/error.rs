//! Error types for table construction and simulation.

use crate::domain::frame::FrameError;
use chrono::NaiveDate;
use thiserror::Error;

/// Rejected at construction time: the engine never starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("rebalance interval must be a positive number of trading days")]
    InvalidRebalanceInterval,

    #[error("starting cash must be finite and positive (got {0})")]
    InvalidStartingCash(f64),

    #[error("{side} allocation percentage must be finite and non-negative (got {value})")]
    InvalidAllocation { side: &'static str, value: f64 },

    #[error("timeline is empty")]
    EmptyTimeline,

    #[error("symbol '{0}' collides with the holdings ledger's cash column")]
    ReservedSymbol(String),

    #[error("{table} table does not cover the engine timeline")]
    TimelineMismatch { table: &'static str },

    #[error("{table} table does not cover the universe: {source}")]
    UniverseMismatch {
        table: &'static str,
        source: FrameError,
    },

    #[error("invalid {field} value {value} for {symbol} on {date}")]
    InvalidValue {
        field: &'static str,
        symbol: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("duplicate market record for {symbol} on {date}")]
    DuplicateRecord { symbol: String, date: NaiveDate },

    #[error("signal threshold rule requires short_below <= long_above (got {short_below} > {long_above})")]
    InvalidThresholds { long_above: f64, short_below: f64 },

    #[error("table error: {0}")]
    Frame(#[from] FrameError),
}

/// Which input a data gap was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapField {
    Close,
    Signal,
}

impl std::fmt::Display for GapField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GapField::Close => write!(f, "close"),
            GapField::Signal => write!(f, "signal"),
        }
    }
}

/// Errors surfaced by `Backtest::new` and `Backtest::run`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("data gap: missing {field} for {symbol} on {date}")]
    DataGap {
        date: NaiveDate,
        symbol: String,
        field: GapField,
    },
}
