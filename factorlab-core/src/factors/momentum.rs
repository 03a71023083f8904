//! Momentum and mean-reversion factors.
//!
//! momentum[t]       = pct_change(lag - exclude)[t - exclude]
//! mean_reversion[t] = pct_change(lag)[t]
//!
//! Momentum skips the most recent `exclude` rows so short-term reversal does
//! not contaminate the trend. With `norm`, both are expanding z-scores.

use super::returns::{pct_change_series, shift_series};
use super::standardize::time_series_zscore;
use super::FactorError;
use crate::domain::Frame;

pub fn momentum(
    price_index: &Frame,
    exclude: usize,
    lag: usize,
    norm: bool,
) -> Result<Frame, FactorError> {
    if exclude >= lag {
        return Err(FactorError::InvalidWindow(format!(
            "momentum lag ({lag}) must be greater than the excluded recent period ({exclude})"
        )));
    }
    Ok(price_index.map_columns(|prices| {
        let raw = shift_series(&pct_change_series(prices, lag - exclude), exclude);
        if norm {
            time_series_zscore(&raw, false)
        } else {
            raw
        }
    }))
}

pub fn mean_reversion(price_index: &Frame, lag: usize, norm: bool) -> Result<Frame, FactorError> {
    if lag == 0 {
        return Err(FactorError::InvalidWindow(
            "mean-reversion lag must be at least 1".into(),
        ));
    }
    Ok(price_index.map_columns(|prices| {
        let raw = pct_change_series(prices, lag);
        if norm {
            time_series_zscore(&raw, false)
        } else {
            raw
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};

    fn prices(values: &[f64]) -> Frame {
        Frame::from_columns(
            test_dates(values.len()),
            vec!["A".into()],
            vec![values.to_vec()],
        )
        .unwrap()
    }

    #[test]
    fn momentum_skips_recent_rows() {
        let p = prices(&[100.0, 101.0, 102.0, 110.0, 90.0]);
        let m = momentum(&p, 1, 3, false).unwrap();
        // pct_change(2) shifted by 1: row 3 sees 102/100 - 1
        for t in 0..3 {
            assert!(m.get(t, 0).is_nan());
        }
        assert_approx(m.get(3, 0), 0.02, DEFAULT_EPSILON);
        assert_approx(m.get(4, 0), 110.0 / 101.0 - 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_rejects_exclude_at_or_above_lag() {
        let p = prices(&[1.0, 2.0]);
        assert!(matches!(
            momentum(&p, 3, 3, true),
            Err(FactorError::InvalidWindow(_))
        ));
        assert!(momentum(&p, 4, 3, true).is_err());
    }

    #[test]
    fn momentum_zero_exclude_equals_mean_reversion() {
        let p = prices(&[10.0, 11.0, 9.0, 12.0, 13.0, 12.5]);
        let m = momentum(&p, 0, 2, true).unwrap();
        let r = mean_reversion(&p, 2, true).unwrap();
        for t in 0..6 {
            let (a, b) = (m.get(t, 0), r.get(t, 0));
            assert!((a.is_nan() && b.is_nan()) || (a - b).abs() < DEFAULT_EPSILON);
        }
    }

    #[test]
    fn normalized_mean_reversion_is_expanding_zscore() {
        let p = prices(&[10.0, 11.0, 9.0, 12.0]);
        let raw = mean_reversion(&p, 1, false).unwrap().column(0);
        let z = mean_reversion(&p, 1, true).unwrap();
        // raw[1..=3] = 0.1, -0.1818.., 0.3333..
        let window = &raw[1..=3];
        let mu = window.iter().sum::<f64>() / 3.0;
        let sd = (window.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / 2.0).sqrt();
        assert_approx(z.get(3, 0), (raw[3] - mu) / sd, 1e-12);
    }
}
