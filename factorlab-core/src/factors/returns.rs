//! Period returns and lags.
//!
//! pct_change[t] = x[t] / x[t - periods] - 1
//!
//! Missing prices are not forward-filled: a `NaN` on either side gives `NaN`.
//!
//! The total-return index compounds split-adjusted price moves plus
//! dividends, matching how the engine carries a held position:
//! level[t] = level[t-1] × split[t] × (close[t] + dividend[t]) / close[t-1]

use crate::domain::{Frame, MarketData};

pub fn pct_change_series(series: &[f64], periods: usize) -> Vec<f64> {
    (0..series.len())
        .map(|t| {
            if t < periods {
                return f64::NAN;
            }
            let (now, then) = (series[t], series[t - periods]);
            if now.is_nan() || then.is_nan() {
                f64::NAN
            } else {
                now / then - 1.0
            }
        })
        .collect()
}

pub fn shift_series(series: &[f64], periods: usize) -> Vec<f64> {
    (0..series.len())
        .map(|t| if t < periods { f64::NAN } else { series[t - periods] })
        .collect()
}

pub fn pct_change(frame: &Frame, periods: usize) -> Frame {
    frame.map_columns(|s| pct_change_series(s, periods))
}

/// Move every column down by `periods` rows, filling the top with `NaN`.
pub fn shift(frame: &Frame, periods: usize) -> Frame {
    frame.map_columns(|s| shift_series(s, periods))
}

/// Total-return index per symbol, starting at each symbol's first valid close.
///
/// A missing close yields `NaN` for that date; the next valid close compounds
/// from the last valid one.
pub fn total_return_index(market: &MarketData) -> Frame {
    let close = market.close();
    let dividends = market.dividends();
    let splits = market.splits();
    let mut index = close.map(|_| f64::NAN);
    for c in 0..close.n_cols() {
        let mut last: Option<(f64, f64)> = None; // (close, level)
        for t in 0..close.n_rows() {
            let price = close.get(t, c);
            if price.is_nan() || price <= 0.0 {
                continue;
            }
            let level = match last {
                None => price,
                Some((prev_close, prev_level)) => {
                    prev_level * splits.get(t, c) * (price + dividends.get(t, c)) / prev_close
                }
            };
            index.set(t, c, level);
            last = Some((price, level));
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_change_two_periods() {
        let out = pct_change_series(&[100.0, 110.0, 120.0, 99.0], 2);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 0.2, DEFAULT_EPSILON);
        assert_approx(out[3], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_does_not_fill_gaps() {
        let out = pct_change_series(&[100.0, f64::NAN, 120.0], 1);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }

    #[test]
    fn total_return_index_compounds_splits_and_dividends() {
        let dates = test_dates(4);
        let cols = vec!["A".to_string()];
        let close =
            Frame::from_columns(dates.clone(), cols.clone(), vec![vec![100.0, 50.0, f64::NAN, 55.0]]).unwrap();
        let divs =
            Frame::from_columns(dates.clone(), cols.clone(), vec![vec![0.0, 0.0, 0.0, 1.0]]).unwrap();
        let splits = Frame::from_columns(dates, cols, vec![vec![1.0, 2.0, 1.0, 1.0]]).unwrap();
        let market = MarketData::new(close, divs, splits).unwrap();

        let idx = total_return_index(&market);
        assert_eq!(idx.get(0, 0), 100.0);
        // 2:1 split at half the price is value-neutral
        assert_approx(idx.get(1, 0), 100.0, DEFAULT_EPSILON);
        assert!(idx.get(2, 0).is_nan());
        // compounds from the last valid close: (55 + 1) / 50
        assert_approx(idx.get(3, 0), 112.0, DEFAULT_EPSILON);
    }

    #[test]
    fn shift_frame_keeps_shape() {
        let frame = Frame::from_rows(
            test_dates(3),
            vec!["A".into(), "B".into()],
            vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]],
        )
        .unwrap();
        let shifted = shift(&frame, 1);
        assert_eq!(shifted.shape(), (3, 2));
        assert!(shifted.get(0, 0).is_nan());
        assert_eq!(shifted.row(2), &[2.0, 20.0]);
    }
}
