//! Multi-symbol time alignment.
//!
//! Given long-format market records for several symbols, build aligned
//! close / dividend / split tables on the union of all dates. A symbol with
//! no record on some date gets a void cell: close `NaN` (no forward-fill of
//! prices), dividend 0, split 1.

use crate::domain::{Frame, MarketData};
use crate::error::ConfigurationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One symbol's market observation on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
    #[serde(default)]
    pub dividends: f64,
    #[serde(default = "no_split")]
    pub stock_splits: f64,
}

fn no_split() -> f64 {
    1.0
}

/// Align records to a common timeline. Symbols are ordered alphabetically.
///
/// Two records for the same symbol and date are rejected.
pub fn align_records(records: &[MarketRecord]) -> Result<MarketData, ConfigurationError> {
    let mut by_symbol: BTreeMap<&str, HashMap<NaiveDate, &MarketRecord>> = BTreeMap::new();
    let mut all_dates = BTreeSet::new();
    for rec in records {
        all_dates.insert(rec.date);
        let per_date = by_symbol.entry(rec.symbol.as_str()).or_default();
        if per_date.insert(rec.date, rec).is_some() {
            return Err(ConfigurationError::DuplicateRecord {
                symbol: rec.symbol.clone(),
                date: rec.date,
            });
        }
    }

    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
    let symbols: Vec<String> = by_symbol.keys().map(|s| s.to_string()).collect();

    let mut close = Vec::with_capacity(symbols.len());
    let mut dividends = Vec::with_capacity(symbols.len());
    let mut splits = Vec::with_capacity(symbols.len());
    for per_date in by_symbol.values() {
        let lookup = |f: fn(&MarketRecord) -> f64, void: f64| -> Vec<f64> {
            dates
                .iter()
                .map(|d| per_date.get(d).map_or(void, |r| f(r)))
                .collect()
        };
        close.push(lookup(|r| r.close, f64::NAN));
        dividends.push(lookup(|r| r.dividends, 0.0));
        splits.push(lookup(|r| r.stock_splits, 1.0));
    }

    MarketData::new(
        Frame::from_columns(dates.clone(), symbols.clone(), close)?,
        Frame::from_columns(dates.clone(), symbols.clone(), dividends)?,
        Frame::from_columns(dates, symbols, splits)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(symbol: &str, date: &str, close: f64) -> MarketRecord {
        MarketRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            symbol: symbol.into(),
            close,
            dividends: 0.0,
            stock_splits: 1.0,
        }
    }

    #[test]
    fn align_fills_missing_with_void_cells() {
        let mut qqq_split = rec("QQQ", "2024-01-04", 202.0);
        qqq_split.stock_splits = 2.0;
        let records = vec![
            rec("SPY", "2024-01-02", 100.0),
            rec("SPY", "2024-01-03", 101.0),
            rec("SPY", "2024-01-04", 102.0),
            rec("QQQ", "2024-01-02", 200.0),
            // QQQ missing 2024-01-03
            qqq_split,
        ];

        let market = align_records(&records).unwrap();

        assert_eq!(market.timeline().len(), 3);
        assert_eq!(market.universe(), &["QQQ".to_string(), "SPY".to_string()]);
        assert_eq!(market.close().get(1, 1), 101.0);
        assert!(market.close().get(1, 0).is_nan());
        assert_eq!(market.dividends().get(1, 0), 0.0);
        assert_eq!(market.splits().get(1, 0), 1.0);
        assert_eq!(market.splits().get(2, 0), 2.0);
    }

    #[test]
    fn duplicate_record_rejected() {
        let records = vec![
            rec("SPY", "2024-01-02", 100.0),
            rec("SPY", "2024-01-02", 100.5),
        ];
        assert!(matches!(
            align_records(&records),
            Err(ConfigurationError::DuplicateRecord { .. })
        ));
    }

    #[test]
    fn empty_input_is_an_empty_timeline() {
        assert_eq!(
            align_records(&[]).unwrap_err(),
            ConfigurationError::EmptyTimeline
        );
    }
}
