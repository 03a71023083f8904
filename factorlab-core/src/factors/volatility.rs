//! Historical volatility factor.
//!
//! vol[t] = sample std of one-period returns over rows t+1-lag..=t
//!
//! With `norm` the series is rescaled by its own expanding mean and std:
//! (vol - mean(vol[0..=t])) / std(vol[0..=t]).

use super::returns::pct_change_series;
use super::stats::{expanding_mean_series, expanding_std_series, rolling_std_series};
use super::FactorError;
use crate::domain::Frame;

pub fn volatility(price_index: &Frame, lag: usize, norm: bool) -> Result<Frame, FactorError> {
    if lag == 0 {
        return Err(FactorError::InvalidWindow(
            "volatility lag must be at least 1".into(),
        ));
    }
    Ok(price_index.map_columns(|prices| {
        let vol = rolling_std_series(&pct_change_series(prices, 1), lag);
        if !norm {
            return vol;
        }
        let mu = expanding_mean_series(&vol);
        let sd = expanding_std_series(&vol);
        vol.iter()
            .zip(mu.iter().zip(&sd))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn constant_growth_has_zero_volatility() {
        let closes: Vec<f64> = (0..6).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let p = Frame::from_columns(test_dates(6), vec!["A".into()], vec![closes]).unwrap();
        let v = volatility(&p, 3, false).unwrap();
        // row 0 has no return, row 1 has a single return
        assert!(v.get(0, 0).is_nan());
        assert!(v.get(1, 0).is_nan());
        for t in 2..6 {
            assert_approx(v.get(t, 0), 0.0, 1e-12);
        }
    }

    #[test]
    fn rolling_window_of_returns() {
        let p = Frame::from_columns(
            test_dates(4),
            vec!["A".into()],
            vec![vec![100.0, 110.0, 99.0, 99.0]],
        )
        .unwrap();
        let v = volatility(&p, 2, false).unwrap();
        // returns: NaN, 0.1, -0.1, 0.0
        let r2 = [0.1, -0.1];
        let mu = 0.0;
        let sd = (r2.iter().map(|r: &f64| (r - mu).powi(2)).sum::<f64>()).sqrt();
        assert_approx(v.get(2, 0), sd, DEFAULT_EPSILON);
        assert_approx(v.get(3, 0), (0.005_f64).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn rejects_zero_lag() {
        let p = Frame::from_columns(test_dates(1), vec!["A".into()], vec![vec![1.0]]).unwrap();
        assert!(volatility(&p, 0, true).is_err());
    }
}
