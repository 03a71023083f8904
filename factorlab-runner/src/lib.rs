//! FactorLab Runner: backtest orchestration on top of `factorlab-core`.
//!
//! This crate provides:
//! - TOML configuration with deterministic run ids
//! - Market and signal CSV loading, plus a seeded synthetic market generator
//! - Signal construction from a file or a thresholded factor
//! - Performance metrics over the account ledger
//! - Artifact export (CSV, Parquet, JSON manifest)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, FactorKind, RunId};
pub use data_loader::{load_market, LoadError, LoadOptions, LoadedData};
pub use export::{load_manifest, save_artifacts, RunManifest};
pub use metrics::PerformanceMetrics;
pub use runner::{
    build_signals, compute_factor, run_backtest, run_from_data, BacktestResult, FactorParams,
    RunError, SCHEMA_VERSION,
};
