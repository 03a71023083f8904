//! Market data: aligned close, dividend and split tables.
//!
//! The close table defines the engine's frozen timeline and universe. The
//! dividend and split tables must share both exactly. Cells that a provider
//! leaves empty mean "no corporate action": dividends normalize to 0 and
//! split ratios to 1. Close prices stay `NaN` when missing; whether that is
//! tolerable is decided at run time.

use super::frame::Frame;
use crate::error::ConfigurationError;
use chrono::NaiveDate;

/// One date's market cross-section, borrowed from `MarketData`.
#[derive(Debug, Clone, Copy)]
pub struct MarketRow<'a> {
    pub date: NaiveDate,
    pub close: &'a [f64],
    pub dividends: &'a [f64],
    pub splits: &'a [f64],
}

/// Close, dividend and split tables over one timeline × universe.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    close: Frame,
    dividends: Frame,
    splits: Frame,
}

impl MarketData {
    /// Validate and normalize the three tables.
    ///
    /// Rejects: an empty timeline, tables whose dates or columns differ from
    /// the close table, negative closes, negative dividends, and
    /// non-positive split ratios.
    pub fn new(close: Frame, dividends: Frame, splits: Frame) -> Result<Self, ConfigurationError> {
        if close.n_rows() == 0 {
            return Err(ConfigurationError::EmptyTimeline);
        }
        let dividends = conform(&close, dividends, "dividends")?;
        let splits = conform(&close, splits, "splits")?;

        check_cells(&close, "close", |v| v.is_nan() || v >= 0.0)?;
        check_cells(&dividends, "dividends", |v| v.is_nan() || v >= 0.0)?;
        check_cells(&splits, "splits", |v| v.is_nan() || v > 0.0)?;

        let dividends = dividends.map(|v| if v.is_nan() { 0.0 } else { v });
        let splits = splits.map(|v| if v.is_nan() { 1.0 } else { v });

        Ok(Self {
            close,
            dividends,
            splits,
        })
    }

    /// Market data with no dividends and no splits.
    pub fn from_close(close: Frame) -> Result<Self, ConfigurationError> {
        let dividends = close.map(|_| 0.0);
        let splits = close.map(|_| 1.0);
        Self::new(close, dividends, splits)
    }

    pub fn timeline(&self) -> &[NaiveDate] {
        self.close.dates()
    }

    pub fn universe(&self) -> &[String] {
        self.close.columns()
    }

    pub fn close(&self) -> &Frame {
        &self.close
    }

    pub fn dividends(&self) -> &Frame {
        &self.dividends
    }

    pub fn splits(&self) -> &Frame {
        &self.splits
    }

    pub fn row(&self, t: usize) -> MarketRow<'_> {
        MarketRow {
            date: self.close.dates()[t],
            close: self.close.row(t),
            dividends: self.dividends.row(t),
            splits: self.splits.row(t),
        }
    }
}

/// Reindex `table` to the close table's columns and check the timeline.
fn conform(close: &Frame, table: Frame, name: &'static str) -> Result<Frame, ConfigurationError> {
    if table.dates() != close.dates() {
        return Err(ConfigurationError::TimelineMismatch { table: name });
    }
    if table.columns() == close.columns() {
        return Ok(table);
    }
    table
        .reindex_columns(close.columns())
        .map_err(|source| ConfigurationError::UniverseMismatch {
            table: name,
            source,
        })
}

fn check_cells(
    frame: &Frame,
    field: &'static str,
    valid: impl Fn(f64) -> bool,
) -> Result<(), ConfigurationError> {
    for t in 0..frame.n_rows() {
        for (c, &v) in frame.row(t).iter().enumerate() {
            if !valid(v) {
                return Err(ConfigurationError::InvalidValue {
                    field,
                    symbol: frame.columns()[c].clone(),
                    date: frame.dates()[t],
                    value: v,
                });
            }
        }
    }
    Ok(())
}
