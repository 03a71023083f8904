//! Engine configuration and the portfolio state folded across the timeline.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Independent capital budgets for the long and short books, in percent of
/// equity. They need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongShortSplit {
    pub long_pct: f64,
    pub short_pct: f64,
}

impl Default for LongShortSplit {
    fn default() -> Self {
        Self {
            long_pct: 70.0,
            short_pct: 30.0,
        }
    }
}

/// How long/short book membership is maintained on drift dates.
///
/// Both books are overwritten wholesale on rebalance dates; the policies only
/// differ for entries whose position no longer carries the book's sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookMembership {
    /// Only entries whose current sign matches the book are overwritten;
    /// everything else keeps its last-known value until the next rebalance.
    #[default]
    CarryForward,
    /// Entries whose current sign does not match the book are reset to 0.
    ClearUnsigned,
}

/// Configuration for a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    /// Trading days between rebalances (1 = every day).
    pub rebalance_interval: usize,
    pub split: LongShortSplit,
    #[serde(default)]
    pub book_membership: BookMembership,
}

impl EngineConfig {
    pub fn new(initial_cash: f64, rebalance_interval: usize, split: LongShortSplit) -> Self {
        Self {
            initial_cash,
            rebalance_interval,
            split,
            book_membership: BookMembership::default(),
        }
    }

    pub fn with_book_membership(mut self, policy: BookMembership) -> Self {
        self.book_membership = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.rebalance_interval == 0 {
            return Err(ConfigurationError::InvalidRebalanceInterval);
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(ConfigurationError::InvalidStartingCash(self.initial_cash));
        }
        for (side, value) in [
            ("long", self.split.long_pct),
            ("short", self.split.short_pct),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidAllocation { side, value });
            }
        }
        Ok(())
    }
}

/// Everything the simulation carries from one date to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    /// Units held per symbol (universe order).
    pub position: Vec<f64>,
    pub long_book: Vec<f64>,
    pub short_book: Vec<f64>,
    /// Dates since the last rebalance; 0 before the first date.
    pub cycle: usize,
}

impl PortfolioState {
    pub fn new(initial_cash: f64, n_symbols: usize) -> Self {
        Self {
            cash: initial_cash,
            position: vec![0.0; n_symbols],
            long_book: vec![0.0; n_symbols],
            short_book: vec![0.0; n_symbols],
            cycle: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.iter().all(|&u| u == 0.0)
    }

    /// Whether today reallocates capital.
    pub fn is_rebalance_due(&self, interval: usize) -> bool {
        self.cycle == 0 || self.cycle == interval
    }
}
