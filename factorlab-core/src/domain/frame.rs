//! Frame: a dense date × symbol table of `f64` values.
//!
//! Rows are indexed by a strictly increasing sequence of dates, columns by
//! unique labels (usually symbols). Storage is row-major so that a single
//! date's cross-section is a contiguous slice. Missing values are `NaN`.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Structural errors when building or combining frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("dates must be strictly increasing (violated at {0})")]
    UnsortedDates(NaiveDate),

    #[error("duplicate column label: {0}")]
    DuplicateColumn(String),

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("unexpected column: {0}")]
    UnexpectedColumn(String),

    #[error("date index mismatch between frames")]
    IndexMismatch,
}

/// Dense 2-D table with an explicit date index and column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl Frame {
    /// A frame with every cell set to `fill`.
    pub fn filled(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        fill: f64,
    ) -> Result<Self, FrameError> {
        check_index(&dates, &columns)?;
        let values = vec![fill; dates.len() * columns.len()];
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// Build from one `Vec` per date (each of length `columns.len()`).
    pub fn from_rows(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, FrameError> {
        check_index(&dates, &columns)?;
        let n_cols = columns.len();
        if rows.len() != dates.len() || rows.iter().any(|r| r.len() != n_cols) {
            return Err(FrameError::ShapeMismatch {
                expected_rows: dates.len(),
                expected_cols: n_cols,
                rows: rows.len(),
                cols: rows.iter().map(|r| r.len()).find(|&l| l != n_cols).unwrap_or(n_cols),
            });
        }
        let values = rows.into_iter().flatten().collect();
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    /// Build from one `Vec` per column (each of length `dates.len()`).
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, FrameError> {
        check_index(&dates, &columns)?;
        let n_rows = dates.len();
        if data.len() != columns.len() || data.iter().any(|c| c.len() != n_rows) {
            return Err(FrameError::ShapeMismatch {
                expected_rows: n_rows,
                expected_cols: columns.len(),
                rows: data.iter().map(|c| c.len()).find(|&l| l != n_rows).unwrap_or(n_rows),
                cols: data.len(),
            });
        }
        let n_cols = columns.len();
        let mut values = vec![f64::NAN; n_rows * n_cols];
        for (c, col) in data.iter().enumerate() {
            for (r, &v) in col.iter().enumerate() {
                values[r * n_cols + c] = v;
            }
        }
        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.n_cols() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let n_cols = self.n_cols();
        self.values[row * n_cols + col] = value;
    }

    /// Cross-section for one date.
    pub fn row(&self, row: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[row * n_cols..(row + 1) * n_cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let n_cols = self.n_cols();
        &mut self.values[row * n_cols..(row + 1) * n_cols]
    }

    /// Time series for one column (copied, since storage is row-major).
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.n_rows()).map(|r| self.get(r, col)).collect()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn column_by_label(&self, label: &str) -> Option<Vec<f64>> {
        self.column_index(label).map(|c| self.column(c))
    }

    /// Row-major cell storage.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// True when no cell is `NaN`.
    pub fn is_complete(&self) -> bool {
        !self.values.iter().any(|v| v.is_nan())
    }

    /// Reorder columns to `order`. Every label in `order` must exist and the
    /// column sets must match exactly.
    pub fn reindex_columns(&self, order: &[String]) -> Result<Frame, FrameError> {
        if let Some(extra) = self.columns.iter().find(|c| !order.contains(c)) {
            return Err(FrameError::UnexpectedColumn(extra.clone()));
        }
        let mut indices = Vec::with_capacity(order.len());
        for label in order {
            let idx = self
                .column_index(label)
                .ok_or_else(|| FrameError::MissingColumn(label.clone()))?;
            indices.push(idx);
        }
        let data = indices.iter().map(|&c| self.column(c)).collect();
        Frame::from_columns(self.dates.clone(), order.to_vec(), data)
    }

    /// First `n` rows (or all rows when `n` exceeds the length).
    pub fn head(&self, n: usize) -> Frame {
        let n = n.min(self.n_rows());
        Self {
            dates: self.dates[..n].to_vec(),
            columns: self.columns.clone(),
            values: self.values[..n * self.n_cols()].to_vec(),
        }
    }

    /// Elementwise transform.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Frame {
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Elementwise combination of two frames with identical index and columns.
    pub fn zip_with(&self, other: &Frame, f: impl Fn(f64, f64) -> f64) -> Result<Frame, FrameError> {
        if self.dates != other.dates {
            return Err(FrameError::IndexMismatch);
        }
        if self.columns != other.columns {
            return Err(FrameError::ShapeMismatch {
                expected_rows: self.n_rows(),
                expected_cols: self.n_cols(),
                rows: other.n_rows(),
                cols: other.n_cols(),
            });
        }
        Ok(Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Apply `f` to every column time series independently. Columns are
    /// processed in parallel; `f` must return a series of the same length.
    pub fn map_columns<F>(&self, f: F) -> Frame
    where
        F: Fn(&[f64]) -> Vec<f64> + Sync,
    {
        let n_rows = self.n_rows();
        let transformed: Vec<Vec<f64>> = (0..self.n_cols())
            .into_par_iter()
            .map(|c| {
                let out = f(&self.column(c));
                debug_assert_eq!(out.len(), n_rows, "column transform changed length");
                out
            })
            .collect();

        let n_cols = self.n_cols();
        let mut values = vec![f64::NAN; n_rows * n_cols];
        for (c, col) in transformed.iter().enumerate() {
            for (r, &v) in col.iter().enumerate().take(n_rows) {
                values[r * n_cols + c] = v;
            }
        }
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Apply `f` to every row cross-section independently.
    pub fn map_rows<F>(&self, f: F) -> Frame
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let mut values = Vec::with_capacity(self.values.len());
        for r in 0..self.n_rows() {
            let out = f(self.row(r));
            debug_assert_eq!(out.len(), self.n_cols(), "row transform changed width");
            values.extend(out);
        }
        Self {
            dates: self.dates.clone(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Append a column at the right edge.
    pub fn with_column(mut self, label: &str, data: &[f64]) -> Result<Frame, FrameError> {
        if self.column_index(label).is_some() {
            return Err(FrameError::DuplicateColumn(label.to_string()));
        }
        if data.len() != self.n_rows() {
            return Err(FrameError::ShapeMismatch {
                expected_rows: self.n_rows(),
                expected_cols: 1,
                rows: data.len(),
                cols: 1,
            });
        }
        let n_cols = self.n_cols();
        let mut values = Vec::with_capacity(self.values.len() + data.len());
        for (r, &extra) in data.iter().enumerate() {
            values.extend_from_slice(&self.values[r * n_cols..(r + 1) * n_cols]);
            values.push(extra);
        }
        self.columns.push(label.to_string());
        self.values = values;
        Ok(self)
    }
}

fn check_index(dates: &[NaiveDate], columns: &[String]) -> Result<(), FrameError> {
    for pair in dates.windows(2) {
        if pair[1] <= pair[0] {
            return Err(FrameError::UnsortedDates(pair[1]));
        }
    }
    let mut seen = HashSet::with_capacity(columns.len());
    for c in columns {
        if !seen.insert(c.as_str()) {
            return Err(FrameError::DuplicateColumn(c.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_dates(n: usize) -> Vec<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect()
}
