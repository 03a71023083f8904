//! Pure per-date transitions: `(prior state, today's rows) -> (state, record)`.
//!
//! Rebalance dates reallocate capital from the current signal; drift dates
//! only carry positions forward through splits and dividend reinvestment.

use super::allocation::{allocate_book, BookSide};
use super::ledger::DailyRecord;
use super::state::{BookMembership, EngineConfig, PortfolioState};
use crate::domain::{MarketRow, Signal};
use crate::error::{GapField, SimError};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// A signaled symbol that received 0 units because its close was zero or
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampedAllocation {
    pub date: NaiveDate,
    pub symbol: String,
    pub long: bool,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub state: PortfolioState,
    pub record: DailyRecord,
    pub clamped: Vec<ClampedAllocation>,
}

/// Split-adjust, then reinvest dividends at today's close.
///
/// Flat symbols are untouched. A held symbol needs a positive close.
pub fn apply_corporate_actions(
    position: &[f64],
    market: &MarketRow<'_>,
    symbols: &[String],
) -> Result<Vec<f64>, SimError> {
    position
        .iter()
        .enumerate()
        .map(|(i, &units)| {
            if units == 0.0 {
                return Ok(units);
            }
            let close = held_close(market, i, symbols)?;
            let split_adjusted = units * market.splits[i];
            Ok(split_adjusted + market.dividends[i] * split_adjusted / close)
        })
        .collect()
}

/// Dollar value per symbol and its sum. Flat symbols are worth exactly 0
/// whatever their close.
pub fn mark_to_market(
    position: &[f64],
    market: &MarketRow<'_>,
    symbols: &[String],
) -> Result<(Vec<f64>, f64), SimError> {
    let mut holdings = Vec::with_capacity(position.len());
    for (i, &units) in position.iter().enumerate() {
        if units == 0.0 {
            holdings.push(0.0);
            continue;
        }
        holdings.push(units * held_close(market, i, symbols)?);
    }
    let total = holdings.iter().sum();
    Ok((holdings, total))
}

fn held_close(market: &MarketRow<'_>, i: usize, symbols: &[String]) -> Result<f64, SimError> {
    let close = market.close[i];
    if close > 0.0 {
        Ok(close)
    } else {
        Err(SimError::DataGap {
            date: market.date,
            symbol: symbols[i].clone(),
            field: GapField::Close,
        })
    }
}

fn resolve_signals(
    row: &[Option<Signal>],
    date: NaiveDate,
    symbols: &[String],
) -> Result<Vec<Signal>, SimError> {
    row.iter()
        .enumerate()
        .map(|(i, s)| {
            s.ok_or_else(|| SimError::DataGap {
                date,
                symbol: symbols[i].clone(),
                field: GapField::Signal,
            })
        })
        .collect()
}

/// Reallocate capital according to today's signals.
pub fn rebalance_step(
    state: PortfolioState,
    market: MarketRow<'_>,
    signals: &[Option<Signal>],
    symbols: &[String],
    config: &EngineConfig,
) -> Result<StepOutput, SimError> {
    let signals = resolve_signals(signals, market.date, symbols)?;

    // Equity is marked on the units held coming into today; the carried
    // value that the new allocation replaces is marked after today's
    // corporate actions.
    let (equity, net_holdings) = if state.is_flat() {
        (state.cash, 0.0)
    } else {
        let (_, carried_value) = mark_to_market(&state.position, &market, symbols)?;
        let adjusted = apply_corporate_actions(&state.position, &market, symbols)?;
        let (_, adjusted_value) = mark_to_market(&adjusted, &market, symbols)?;
        (carried_value + state.cash, adjusted_value)
    };

    let long = allocate_book(
        BookSide::Long,
        equity,
        config.split.long_pct,
        &signals,
        market.close,
    );
    let short = allocate_book(
        BookSide::Short,
        equity,
        config.split.short_pct,
        &signals,
        market.close,
    );

    let position: Vec<f64> = long
        .units
        .iter()
        .zip(&short.units)
        .map(|(l, s)| l + s)
        .collect();
    let (holdings, equities) = mark_to_market(&position, &market, symbols)?;
    let cash = state.cash - (equities - net_holdings);

    let clamped: Vec<ClampedAllocation> = long
        .clamped
        .iter()
        .map(|&i| (i, true))
        .chain(short.clamped.iter().map(|&i| (i, false)))
        .map(|(i, is_long)| {
            debug!(
                "{}: {} allocation for {} clamped to 0 (close {})",
                market.date,
                if is_long { "long" } else { "short" },
                symbols[i],
                market.close[i]
            );
            ClampedAllocation {
                date: market.date,
                symbol: symbols[i].clone(),
                long: is_long,
            }
        })
        .collect();

    debug!(
        "{}: rebalance equity={equity:.2} longs={} shorts={} equities={equities:.2} cash={cash:.2}",
        market.date, long.count, short.count
    );

    Ok(StepOutput {
        state: PortfolioState {
            cash,
            position: position.clone(),
            long_book: long.units,
            short_book: short.units,
            cycle: 1,
        },
        record: DailyRecord {
            date: market.date,
            rebalanced: true,
            position,
            holdings,
            equities,
            cash,
        },
        clamped,
    })
}

/// Carry positions forward without reallocating.
pub fn drift_step(
    state: PortfolioState,
    market: MarketRow<'_>,
    symbols: &[String],
    config: &EngineConfig,
) -> Result<StepOutput, SimError> {
    let position = apply_corporate_actions(&state.position, &market, symbols)?;
    let (holdings, net_holdings) = mark_to_market(&position, &market, symbols)?;

    let mut long_book = state.long_book;
    let mut short_book = state.short_book;
    update_books(&position, &mut long_book, &mut short_book, config.book_membership);

    Ok(StepOutput {
        state: PortfolioState {
            cash: state.cash,
            position: position.clone(),
            long_book,
            short_book,
            cycle: state.cycle + 1,
        },
        record: DailyRecord {
            date: market.date,
            rebalanced: false,
            position,
            holdings,
            equities: net_holdings,
            cash: state.cash,
        },
        clamped: Vec::new(),
    })
}

/// Refresh book entries from the sign of the drifted position.
pub fn update_books(
    position: &[f64],
    long_book: &mut [f64],
    short_book: &mut [f64],
    policy: BookMembership,
) {
    for (i, &units) in position.iter().enumerate() {
        match policy {
            BookMembership::CarryForward => {
                if units > 0.0 {
                    long_book[i] = units;
                } else if units < 0.0 {
                    short_book[i] = units;
                }
            }
            BookMembership::ClearUnsigned => {
                long_book[i] = if units > 0.0 { units } else { 0.0 };
                short_book[i] = if units < 0.0 { units } else { 0.0 };
            }
        }
    }
}
