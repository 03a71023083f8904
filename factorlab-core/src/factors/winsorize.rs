//! Outlier clipping.
//!
//! `winsorize` clips each cell to quantiles of its own column computed over
//! rows `0..=t`, so it is safe to use in a backtest. `full_winsorize` clips to
//! quantiles of every cell in the table and therefore uses future data; it is
//! meant for offline statistical modelling only.

use super::stats::{check_quantile, expanding_quantile_series, quantile};
use super::FactorError;
use crate::domain::Frame;

pub const DEFAULT_LOWER_Q: f64 = 0.05;
pub const DEFAULT_UPPER_Q: f64 = 0.95;
pub const DEFAULT_FULL_LOWER_Q: f64 = 0.001;
pub const DEFAULT_FULL_UPPER_Q: f64 = 0.999;

pub fn winsorize(frame: &Frame, lower_q: f64, upper_q: f64) -> Result<Frame, FactorError> {
    check_bounds(lower_q, upper_q)?;
    Ok(frame.map_columns(|s| {
        let lower = expanding_quantile_series(s, lower_q);
        let upper = expanding_quantile_series(s, upper_q);
        s.iter()
            .zip(lower.iter().zip(&upper))
            .map(|(&x, (&lo, &hi))| clip(x, lo, hi))
            .collect()
    }))
}

pub fn full_winsorize(frame: &Frame, lower_q: f64, upper_q: f64) -> Result<Frame, FactorError> {
    check_bounds(lower_q, upper_q)?;
    let lo = quantile(frame.values(), lower_q);
    let hi = quantile(frame.values(), upper_q);
    Ok(frame.map(|x| clip(x, lo, hi)))
}

/// `NaN` cells and `NaN` bounds pass through unchanged.
fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x > hi {
        hi
    } else if x < lo {
        lo
    } else {
        x
    }
}

fn check_bounds(lower: f64, upper: f64) -> Result<(), FactorError> {
    check_quantile(lower).and(check_quantile(upper)).and_then(|_| {
        if lower <= upper {
            Ok(())
        } else {
            Err(FactorError::InvalidQuantile { lower, upper })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;

    fn column(values: Vec<f64>) -> Frame {
        Frame::from_columns(test_dates(values.len()), vec!["A".into()], vec![values]).unwrap()
    }

    #[test]
    fn expanding_clip_ignores_future_outliers() {
        let f = column(vec![1.0, 2.0, 3.0, 4.0, 1000.0]);
        let w = winsorize(&f, 0.05, 0.95).unwrap();
        // earlier rows unaffected by the final spike
        let full = winsorize(&f.head(4), 0.05, 0.95).unwrap();
        for t in 0..4 {
            assert_eq!(w.get(t, 0), full.get(t, 0));
        }
        // the spike is clipped to the 95th percentile of rows 0..=4
        let expected = quantile(&[1.0, 2.0, 3.0, 4.0, 1000.0], 0.95);
        assert_eq!(w.get(4, 0), expected);
        assert!(w.get(4, 0) < 1000.0);
    }

    #[test]
    fn full_winsorize_uses_all_cells() {
        let f = Frame::from_columns(
            test_dates(3),
            vec!["A".into(), "B".into()],
            vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]],
        )
        .unwrap();
        let w = full_winsorize(&f, 0.2, 0.8).unwrap();
        // pooled [0..5]: q0.2 = 1.0, q0.8 = 4.0
        assert_eq!(w.column(0), vec![1.0, 1.0, 2.0]);
        assert_eq!(w.column(1), vec![3.0, 4.0, 4.0]);
    }

    #[test]
    fn nan_cells_pass_through() {
        let f = column(vec![f64::NAN, 1.0, 2.0]);
        let w = winsorize(&f, DEFAULT_LOWER_Q, DEFAULT_UPPER_Q).unwrap();
        assert!(w.get(0, 0).is_nan());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let f = column(vec![1.0]);
        assert!(matches!(
            winsorize(&f, 0.9, 0.1),
            Err(FactorError::InvalidQuantile { .. })
        ));
        assert!(full_winsorize(&f, -0.1, 0.5).is_err());
    }
}
