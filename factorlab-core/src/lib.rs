//! FactorLab Core: tables, simulation engine, factor library.
//!
//! This crate contains the heart of the long/short portfolio simulator:
//! - `Frame`, a dense date × symbol table, and the market / signal tables
//!   built on it
//! - Date-by-date rebalance/drift engine folded over an explicit state
//! - Pure factor transforms (momentum, mean reversion, volatility,
//!   standardization, winsorization) with no look-ahead
//! - Alignment of long-format market records onto a common timeline

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod factors;

pub use domain::{Frame, FrameError, MarketData, Signal, SignalTable, ThresholdRule};
pub use engine::{Backtest, EngineConfig, LongShortSplit, SimulationResult};
pub use error::{ConfigurationError, SimError};
