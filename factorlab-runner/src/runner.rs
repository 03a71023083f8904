//! Backtest runner: wires together data loading, signal construction,
//! the engine, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: loads market data per the config, then runs. Used by CLI.
//! - `run_from_data()`: takes pre-loaded data. No market I/O.

use factorlab_core::engine::RunDiagnostics;
use factorlab_core::factors::{
    mean_reversion, momentum, total_return_index, volatility, winsorize, FactorError,
};
use factorlab_core::factors::winsorize::{DEFAULT_LOWER_Q, DEFAULT_UPPER_Q};
use factorlab_core::{
    Backtest, ConfigurationError, Frame, MarketData, SignalTable, SimError, SimulationResult,
    ThresholdRule,
};
use log::info;
use thiserror::Error;

use crate::config::{BacktestConfig, ConfigError, FactorKind, FactorSignalConfig, RunId};
use crate::data_loader::{load_market, load_signal_csv, LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("factor error: {0}")]
    Factor(#[from] FactorError),
    #[error("signal error: {0}")]
    Signal(#[from] ConfigurationError),
    #[error("simulation error: {0}")]
    Sim(#[from] SimError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Parameters of a factor score, independent of how it is thresholded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorParams {
    pub kind: FactorKind,
    pub lag: usize,
    pub exclude: usize,
    pub norm: bool,
    pub winsorize: bool,
}

impl From<&FactorSignalConfig> for FactorParams {
    fn from(cfg: &FactorSignalConfig) -> Self {
        Self {
            kind: cfg.kind,
            lag: cfg.lag,
            exclude: cfg.exclude,
            norm: cfg.norm,
            winsorize: cfg.winsorize,
        }
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub simulation: SimulationResult,
}

impl BacktestResult {
    pub fn diagnostics(&self) -> &RunDiagnostics {
        &self.simulation.diagnostics
    }

    pub fn start_date(&self) -> Option<chrono::NaiveDate> {
        self.simulation.account.rows().first().map(|r| r.date)
    }

    pub fn end_date(&self) -> Option<chrono::NaiveDate> {
        self.simulation.account.rows().last().map(|r| r.date)
    }
}

/// Run a backtest from a config, loading market data as it directs.
///
/// `synthetic` forces the `[data.synthetic]` generator even when a market
/// file is configured.
pub fn run_backtest(config: &BacktestConfig, synthetic: bool) -> Result<BacktestResult, RunError> {
    let loaded = load_market(&config.data, synthetic)?;
    run_from_data(config, loaded)
}

/// Run a backtest on pre-loaded market data.
pub fn run_from_data(config: &BacktestConfig, loaded: LoadedData) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let signals = build_signals(config, &loaded.market)?;

    info!(
        "run {}: {} dates x {} symbols",
        &run_id[..12],
        loaded.market.timeline().len(),
        loaded.market.universe().len(),
    );

    let backtest = Backtest::new(config.engine_config(), loaded.market, signals)?;
    let simulation = backtest.run()?;
    let metrics = PerformanceMetrics::compute(&simulation.account);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: loaded.dataset_hash,
        synthetic: loaded.synthetic,
        config: config.clone(),
        metrics,
        simulation,
    })
}

/// Signal table from the configured source: a wide CSV file or a
/// thresholded factor computed on the total-return index.
pub fn build_signals(config: &BacktestConfig, market: &MarketData) -> Result<SignalTable, RunError> {
    match (&config.signal.file, &config.signal.factor) {
        (Some(path), _) => Ok(load_signal_csv(path)?),
        (None, Some(factor)) => {
            let scores = compute_factor(&FactorParams::from(factor), &total_return_index(market))?;
            let rule = ThresholdRule::new(factor.long_above, factor.short_below)?;
            Ok(SignalTable::from_scores(&scores, rule))
        }
        (None, None) => Err(ConfigError::Invalid("no signal source configured".into()).into()),
    }
}

/// Factor scores over a price index, optionally winsorized at the expanding
/// 5% / 95% quantiles.
pub fn compute_factor(params: &FactorParams, price_index: &Frame) -> Result<Frame, FactorError> {
    let scores = match params.kind {
        FactorKind::Momentum => momentum(price_index, params.exclude, params.lag, params.norm)?,
        FactorKind::MeanReversion => mean_reversion(price_index, params.lag, params.norm)?,
        FactorKind::Volatility => volatility(price_index, params.lag, params.norm)?,
    };
    if params.winsorize {
        winsorize(&scores, DEFAULT_LOWER_Q, DEFAULT_UPPER_Q)
    } else {
        Ok(scores)
    }
}
