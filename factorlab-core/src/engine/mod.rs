//! Simulation engine: long/short rebalancing over a fixed timeline.
//!
//! The engine consumes aligned market data and a signal table, then folds an
//! explicit `PortfolioState` across the dates:
//!
//! 1. Rebalance dates: mark equity, apply corporate actions, allocate the
//!    long and short budgets evenly across signaled symbols, settle cash
//! 2. Drift dates: split-adjust and reinvest dividends, mark to market
//!
//! Every date produces one row in each of the three output ledgers.

pub mod allocation;
pub mod ledger;
pub mod loop_runner;
pub mod state;
pub mod step;

pub use allocation::{allocate_book, Allocation, BookSide, BookTarget};
pub use ledger::{AccountLedger, AccountRow, DailyRecord, HoldingsLedger, CASH_COLUMN};
pub use loop_runner::{Backtest, RunDiagnostics, SimulationResult};
pub use state::{BookMembership, EngineConfig, LongShortSplit, PortfolioState};
pub use step::{
    apply_corporate_actions, drift_step, mark_to_market, rebalance_step, update_books,
    ClampedAllocation, StepOutput,
};
