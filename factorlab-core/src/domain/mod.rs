//! Domain types for FactorLab

pub mod frame;
pub mod market;
pub mod signal;

pub use frame::{Frame, FrameError};
pub use market::{MarketData, MarketRow};
pub use signal::{Signal, SignalTable, ThresholdRule};
