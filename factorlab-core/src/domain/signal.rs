//! Discrete trading signals and the per-date signal table.

use super::frame::Frame;
use crate::error::ConfigurationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Desired direction for one symbol on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    /// Parse the numeric encoding {-1, 0, 1}. Anything else is `None`.
    pub fn from_value(v: f64) -> Option<Self> {
        if v == 1.0 {
            Some(Signal::Long)
        } else if v == 0.0 {
            Some(Signal::Flat)
        } else if v == -1.0 {
            Some(Signal::Short)
        } else {
            None
        }
    }

    pub fn as_value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }
}

/// Rule turning continuous factor scores into signals.
///
/// `score > long_above` → Long, `score < short_below` → Short, otherwise Flat.
/// Missing scores (warm-up rows of expanding statistics) are Flat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub long_above: f64,
    pub short_below: f64,
}

impl ThresholdRule {
    pub fn new(long_above: f64, short_below: f64) -> Result<Self, ConfigurationError> {
        if short_below.is_nan() || long_above.is_nan() || short_below > long_above {
            return Err(ConfigurationError::InvalidThresholds {
                long_above,
                short_below,
            });
        }
        Ok(Self {
            long_above,
            short_below,
        })
    }

    pub fn classify(&self, score: f64) -> Signal {
        if score > self.long_above {
            Signal::Long
        } else if score < self.short_below {
            Signal::Short
        } else {
            Signal::Flat
        }
    }
}

/// Date × symbol table of signals. A `None` cell is a gap in the provider's
/// output and aborts a simulation that reaches it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    cells: Vec<Option<Signal>>,
}

impl SignalTable {
    /// Strict conversion from a numeric frame: cells must be -1, 0, 1 or `NaN`.
    pub fn from_frame(frame: &Frame) -> Result<Self, ConfigurationError> {
        let mut cells = Vec::with_capacity(frame.values().len());
        for t in 0..frame.n_rows() {
            for (c, &v) in frame.row(t).iter().enumerate() {
                if v.is_nan() {
                    cells.push(None);
                    continue;
                }
                let signal = Signal::from_value(v).ok_or_else(|| ConfigurationError::InvalidValue {
                    field: "signal",
                    symbol: frame.columns()[c].clone(),
                    date: frame.dates()[t],
                    value: v,
                })?;
                cells.push(Some(signal));
            }
        }
        Ok(Self {
            dates: frame.dates().to_vec(),
            symbols: frame.columns().to_vec(),
            cells,
        })
    }

    /// Classify every score with `rule`. Always fully populated.
    pub fn from_scores(scores: &Frame, rule: ThresholdRule) -> Self {
        let cells = scores
            .values()
            .iter()
            .map(|&s| Some(if s.is_nan() { Signal::Flat } else { rule.classify(s) }))
            .collect();
        Self {
            dates: scores.dates().to_vec(),
            symbols: scores.columns().to_vec(),
            cells,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn row(&self, t: usize) -> &[Option<Signal>] {
        let n = self.symbols.len();
        &self.cells[t * n..(t + 1) * n]
    }

    pub fn get(&self, t: usize, c: usize) -> Option<Signal> {
        self.row(t)[c]
    }

    /// Numeric view: -1/0/1, `NaN` for gaps.
    pub fn to_frame(&self) -> Frame {
        let rows = (0..self.dates.len())
            .map(|t| {
                self.row(t)
                    .iter()
                    .map(|s| s.map_or(f64::NAN, |s| f64::from(s.as_value())))
                    .collect()
            })
            .collect();
        // Dates and symbols come from a validated frame.
        Frame::from_rows(self.dates.clone(), self.symbols.clone(), rows)
            .unwrap_or_else(|e| unreachable!("signal table index was validated: {e}"))
    }

    /// Reorder columns to `universe`; the symbol sets must match exactly.
    pub fn reindex(&self, universe: &[String]) -> Result<Self, ConfigurationError> {
        if self.symbols == universe {
            return Ok(self.clone());
        }
        let reordered = self
            .to_frame()
            .reindex_columns(universe)
            .map_err(|source| ConfigurationError::UniverseMismatch {
                table: "signal",
                source,
            })?;
        Self::from_frame(&reordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;

    fn frame(rows: Vec<Vec<f64>>) -> Frame {
        Frame::from_rows(test_dates(rows.len()), vec!["A".into(), "B".into()], rows).unwrap()
    }

    #[test]
    fn parses_numeric_encoding() {
        let table = SignalTable::from_frame(&frame(vec![vec![1.0, -1.0], vec![0.0, f64::NAN]]))
            .unwrap();
        assert_eq!(table.row(0), &[Some(Signal::Long), Some(Signal::Short)]);
        assert_eq!(table.row(1), &[Some(Signal::Flat), None]);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let err = SignalTable::from_frame(&frame(vec![vec![0.5, 0.0]])).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue { field: "signal", .. }
        ));
    }

    #[test]
    fn threshold_rule_classifies_scores() {
        let rule = ThresholdRule::new(1.0, -1.0).unwrap();
        let scores = frame(vec![vec![1.5, -2.0], vec![0.2, f64::NAN]]);
        let table = SignalTable::from_scores(&scores, rule);
        assert_eq!(table.row(0), &[Some(Signal::Long), Some(Signal::Short)]);
        assert_eq!(table.row(1), &[Some(Signal::Flat), Some(Signal::Flat)]);
    }

    #[test]
    fn threshold_rule_rejects_inverted_band() {
        assert!(ThresholdRule::new(-1.0, 1.0).is_err());
        assert!(ThresholdRule::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn reindex_reorders_columns() {
        let table = SignalTable::from_frame(&frame(vec![vec![1.0, -1.0]])).unwrap();
        let r = table.reindex(&["B".to_string(), "A".to_string()]).unwrap();
        assert_eq!(r.row(0), &[Some(Signal::Short), Some(Signal::Long)]);
        assert!(table.reindex(&["A".to_string()]).is_err());
    }
}
