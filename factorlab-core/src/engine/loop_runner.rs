//! Date-by-date simulation loop: the heart of the engine.
//!
//! Each date is either a rebalance date (first date, then every
//! `rebalance_interval` dates) or a drift date. The loop folds
//! `PortfolioState` across the timeline with the step functions and writes
//! one complete ledger row per date.

use super::ledger::{AccountLedger, HoldingsLedger, LedgerBuilder, CASH_COLUMN};
use super::state::{EngineConfig, PortfolioState};
use super::step::{drift_step, rebalance_step, ClampedAllocation};
use crate::domain::{Frame, MarketData, SignalTable};
use crate::error::{ConfigurationError, SimError};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Run statistics that are not part of the ledgers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub rebalance_count: usize,
    /// Signaled symbols that received 0 units because of a zero or missing close.
    pub clamped: Vec<ClampedAllocation>,
    /// Dates whose closing cash balance was negative.
    pub negative_cash_days: usize,
}

/// Result of a complete simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Units per symbol per date.
    pub positions: Frame,
    /// Dollar value per symbol per date, with the daily cash column.
    pub holdings: HoldingsLedger,
    /// equities (net holdings value) and cash per date.
    pub account: AccountLedger,
    pub diagnostics: RunDiagnostics,
}

/// A configured simulation over a frozen timeline and universe.
///
/// `run` consumes the backtest, so a simulation executes exactly once.
#[derive(Debug, Clone)]
pub struct Backtest {
    config: EngineConfig,
    market: MarketData,
    signals: SignalTable,
}

impl Backtest {
    /// Validate the configuration and check that the signal table covers
    /// exactly the market timeline and universe. Signal columns may arrive in
    /// any order; they are aligned to the market universe. A symbol named
    /// `cash` is rejected since the holdings ledger reserves that column.
    pub fn new(
        config: EngineConfig,
        market: MarketData,
        signals: SignalTable,
    ) -> Result<Self, SimError> {
        config.validate()?;
        if let Some(symbol) = market.universe().iter().find(|s| s.as_str() == CASH_COLUMN) {
            return Err(ConfigurationError::ReservedSymbol(symbol.clone()).into());
        }
        if signals.dates() != market.timeline() {
            return Err(ConfigurationError::TimelineMismatch { table: "signal" }.into());
        }
        let signals = signals.reindex(market.universe())?;
        Ok(Self {
            config,
            market,
            signals,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn market(&self) -> &MarketData {
        &self.market
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Walk the timeline once. Any data gap aborts the whole run.
    pub fn run(self) -> Result<SimulationResult, SimError> {
        let symbols = self.market.universe().to_vec();
        let n_dates = self.market.timeline().len();
        info!(
            "simulating {} dates x {} symbols (cash={:.2}, interval={}, long={}%, short={}%)",
            n_dates,
            symbols.len(),
            self.config.initial_cash,
            self.config.rebalance_interval,
            self.config.split.long_pct,
            self.config.split.short_pct
        );

        let mut state = PortfolioState::new(self.config.initial_cash, symbols.len());
        let mut ledger = LedgerBuilder::with_capacity(&symbols, n_dates);
        let mut diagnostics = RunDiagnostics::default();

        for t in 0..n_dates {
            let market = self.market.row(t);
            let step = if state.is_rebalance_due(self.config.rebalance_interval) {
                diagnostics.rebalance_count += 1;
                rebalance_step(state, market, self.signals.row(t), &symbols, &self.config)?
            } else {
                drift_step(state, market, &symbols, &self.config)?
            };

            if step.record.cash < 0.0 {
                diagnostics.negative_cash_days += 1;
            }
            diagnostics.clamped.extend(step.clamped);
            ledger.push(step.record);
            state = step.state;
        }

        let (positions, holdings, account) = ledger.finish().map_err(ConfigurationError::from)?;

        if !diagnostics.clamped.is_empty() {
            warn!(
                "{} allocation(s) clamped to 0 because of zero or missing close prices",
                diagnostics.clamped.len()
            );
        }
        if let Some(last) = account.rows().last() {
            info!(
                "simulation complete: {} rebalances, final equities={:.2} cash={:.2} total={:.2}",
                diagnostics.rebalance_count,
                last.equities,
                last.cash,
                last.total_value()
            );
        }

        Ok(SimulationResult {
            positions,
            holdings,
            account,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;
    use crate::engine::state::LongShortSplit;

    fn two_symbol_frame(rows: Vec<Vec<f64>>) -> Frame {
        Frame::from_rows(test_dates(rows.len()), vec!["A".into(), "B".into()], rows).unwrap()
    }

    fn signals(rows: Vec<Vec<f64>>) -> SignalTable {
        SignalTable::from_frame(&two_symbol_frame(rows)).unwrap()
    }

    fn split(long_pct: f64, short_pct: f64) -> LongShortSplit {
        LongShortSplit {
            long_pct,
            short_pct,
        }
    }

    #[test]
    fn rejects_symbol_named_like_cash_column() {
        let frame = |rows: Vec<Vec<f64>>| {
            Frame::from_rows(test_dates(rows.len()), vec!["A".into(), "cash".into()], rows).unwrap()
        };
        let market = MarketData::from_close(frame(vec![vec![1.0, 1.0]; 2])).unwrap();
        let sig = SignalTable::from_frame(&frame(vec![vec![1.0, 0.0]; 2])).unwrap();
        let err = Backtest::new(EngineConfig::new(1_000.0, 1, split(100.0, 0.0)), market, sig)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::Configuration(ConfigurationError::ReservedSymbol("cash".into()))
        );
    }

    #[test]
    fn rejects_signal_timeline_mismatch() {
        let market = MarketData::from_close(two_symbol_frame(vec![vec![1.0, 1.0]; 3])).unwrap();
        let sig = signals(vec![vec![0.0, 0.0]; 2]);
        let err = Backtest::new(EngineConfig::new(1_000.0, 1, split(100.0, 0.0)), market, sig)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::Configuration(ConfigurationError::TimelineMismatch { table: "signal" })
        );
    }

    #[test]
    fn rejects_signal_universe_mismatch() {
        let market = MarketData::from_close(two_symbol_frame(vec![vec![1.0, 1.0]])).unwrap();
        let sig = SignalTable::from_frame(
            &Frame::from_rows(test_dates(1), vec!["A".into()], vec![vec![1.0]]).unwrap(),
        )
        .unwrap();
        let err = Backtest::new(EngineConfig::new(1_000.0, 1, split(100.0, 0.0)), market, sig)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Configuration(ConfigurationError::UniverseMismatch { table: "signal", .. })
        ));
    }

    #[test]
    fn rejects_zero_interval() {
        let market = MarketData::from_close(two_symbol_frame(vec![vec![1.0, 1.0]])).unwrap();
        let sig = signals(vec![vec![0.0, 0.0]]);
        let err = Backtest::new(EngineConfig::new(1_000.0, 0, split(100.0, 0.0)), market, sig)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::Configuration(ConfigurationError::InvalidRebalanceInterval)
        );
    }

    #[test]
    fn interval_one_rebalances_every_date() {
        let market =
            MarketData::from_close(two_symbol_frame(vec![vec![10.0, 20.0]; 4])).unwrap();
        let sig = signals(vec![vec![1.0, 0.0]; 4]);
        let result = Backtest::new(EngineConfig::new(1_000.0, 1, split(100.0, 0.0)), market, sig)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(result.diagnostics.rebalance_count, 4);
    }

    #[test]
    fn interval_three_rebalances_every_third_date() {
        let market =
            MarketData::from_close(two_symbol_frame(vec![vec![10.0, 20.0]; 7])).unwrap();
        let sig = signals(vec![vec![1.0, 0.0]; 7]);
        let result = Backtest::new(EngineConfig::new(1_000.0, 3, split(100.0, 0.0)), market, sig)
            .unwrap()
            .run()
            .unwrap();
        // dates 0, 3, 6
        assert_eq!(result.diagnostics.rebalance_count, 3);
    }

    #[test]
    fn data_gap_aborts_run() {
        let market = MarketData::from_close(two_symbol_frame(vec![
            vec![10.0, 20.0],
            vec![f64::NAN, 20.0],
        ]))
        .unwrap();
        let sig = signals(vec![vec![1.0, 0.0], vec![1.0, 0.0]]);
        let err = Backtest::new(EngineConfig::new(1_000.0, 5, split(100.0, 0.0)), market, sig)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, SimError::DataGap { ref symbol, .. } if symbol == "A"));
    }

    #[test]
    fn negative_cash_is_not_clamped() {
        // 150% long with no shorts borrows cash.
        let market = MarketData::from_close(two_symbol_frame(vec![vec![10.0, 20.0]])).unwrap();
        let sig = signals(vec![vec![1.0, 0.0]]);
        let result = Backtest::new(EngineConfig::new(1_000.0, 1, split(150.0, 0.0)), market, sig)
            .unwrap()
            .run()
            .unwrap();
        let row = result.account.rows()[0];
        assert!((row.cash + 500.0).abs() < 1e-9);
        assert_eq!(result.diagnostics.negative_cash_days, 1);
    }
}
