//! Output ledgers: one row per date for positions, holdings and account.

use crate::domain::frame::{Frame, FrameError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column label for the cash column merged into the holdings table.
pub const CASH_COLUMN: &str = "cash";

/// Everything written for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub rebalanced: bool,
    /// Units per symbol.
    pub position: Vec<f64>,
    /// Dollar value per symbol at today's close.
    pub holdings: Vec<f64>,
    /// Sum of `holdings`.
    pub equities: f64,
    pub cash: f64,
}

/// Per-symbol dollar holdings plus the daily cash balance.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingsLedger {
    values: Frame,
    cash: Vec<f64>,
}

impl HoldingsLedger {
    pub fn values(&self) -> &Frame {
        &self.values
    }

    pub fn cash(&self) -> &[f64] {
        &self.cash
    }

    /// Single table with the universe columns followed by `cash`.
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        self.values.clone().with_column(CASH_COLUMN, &self.cash)
    }
}

/// One account row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountRow {
    pub date: NaiveDate,
    pub equities: f64,
    pub cash: f64,
}

impl AccountRow {
    pub fn total_value(&self) -> f64 {
        self.equities + self.cash
    }
}

/// Account-level equities (net holdings value) and cash per date.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountLedger {
    rows: Vec<AccountRow>,
}

impl AccountLedger {
    pub fn rows(&self) -> &[AccountRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn equities(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.equities).collect()
    }

    pub fn cash(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cash).collect()
    }

    /// equities + cash per date.
    pub fn total_value(&self) -> Vec<f64> {
        self.rows.iter().map(AccountRow::total_value).collect()
    }

    /// Two-column table: `equities`, `cash`.
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        Frame::from_columns(
            self.rows.iter().map(|r| r.date).collect(),
            vec!["equities".into(), CASH_COLUMN.into()],
            vec![self.equities(), self.cash()],
        )
    }
}

/// Accumulates daily records during the run and assembles the ledgers.
#[derive(Debug)]
pub(crate) struct LedgerBuilder {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    positions: Vec<Vec<f64>>,
    holdings: Vec<Vec<f64>>,
    account: Vec<AccountRow>,
}

impl LedgerBuilder {
    pub(crate) fn with_capacity(symbols: &[String], n_dates: usize) -> Self {
        Self {
            symbols: symbols.to_vec(),
            dates: Vec::with_capacity(n_dates),
            positions: Vec::with_capacity(n_dates),
            holdings: Vec::with_capacity(n_dates),
            account: Vec::with_capacity(n_dates),
        }
    }

    pub(crate) fn push(&mut self, record: DailyRecord) {
        self.dates.push(record.date);
        self.account.push(AccountRow {
            date: record.date,
            equities: record.equities,
            cash: record.cash,
        });
        self.positions.push(record.position);
        self.holdings.push(record.holdings);
    }

    pub(crate) fn finish(self) -> Result<(Frame, HoldingsLedger, AccountLedger), FrameError> {
        let cash = self.account.iter().map(|r| r.cash).collect();
        let positions = Frame::from_rows(self.dates.clone(), self.symbols.clone(), self.positions)?;
        let values = Frame::from_rows(self.dates, self.symbols, self.holdings)?;
        Ok((
            positions,
            HoldingsLedger { values, cash },
            AccountLedger { rows: self.account },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;

    fn record(date: NaiveDate, units: f64, price: f64, cash: f64) -> DailyRecord {
        DailyRecord {
            date,
            rebalanced: false,
            position: vec![units],
            holdings: vec![units * price],
            equities: units * price,
            cash,
        }
    }

    #[test]
    fn builder_assembles_all_three_ledgers() {
        let dates = test_dates(2);
        let mut builder = LedgerBuilder::with_capacity(&["A".to_string()], 2);
        builder.push(record(dates[0], 10.0, 100.0, 0.0));
        builder.push(record(dates[1], 10.0, 110.0, 0.0));
        let (positions, holdings, account) = builder.finish().unwrap();

        assert_eq!(positions.column(0), vec![10.0, 10.0]);
        assert_eq!(holdings.values().column(0), vec![1000.0, 1100.0]);
        assert_eq!(account.equities(), vec![1000.0, 1100.0]);
        assert_eq!(account.total_value(), vec![1000.0, 1100.0]);
    }

    #[test]
    fn holdings_frame_carries_cash_last() {
        let dates = test_dates(1);
        let mut builder = LedgerBuilder::with_capacity(&["A".to_string()], 1);
        builder.push(record(dates[0], 2.0, 5.0, 90.0));
        let (_, holdings, account) = builder.finish().unwrap();

        let merged = holdings.to_frame().unwrap();
        assert_eq!(merged.columns().last().map(String::as_str), Some(CASH_COLUMN));
        assert_eq!(merged.row(0), &[10.0, 90.0]);

        let acct = account.to_frame().unwrap();
        assert_eq!(acct.row(0), &[10.0, 90.0]);
        assert_eq!(account.rows()[0].total_value(), 100.0);
    }
}
