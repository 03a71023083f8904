//! Window statistics over single series and whole frames.
//!
//! Every statistic skips `NaN` inputs. Expanding statistics at row `t` read
//! rows `0..=t` only; rolling statistics read rows `t+1-window..=t`.
//! Sample standard deviations use `n - 1` in the denominator, so they are
//! `NaN` until two valid observations exist.

use super::FactorError;
use crate::domain::Frame;

// ─── Series kernels ──────────────────────────────────────────────────

/// Arithmetic mean of the valid values, `NaN` when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Sample standard deviation of the valid values.
pub fn sample_std(values: &[f64]) -> f64 {
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.len() < 2 {
        return f64::NAN;
    }
    let mu = valid.iter().sum::<f64>() / valid.len() as f64;
    let ss: f64 = valid.iter().map(|v| (v - mu).powi(2)).sum();
    (ss / (valid.len() - 1) as f64).sqrt()
}

/// Linear-interpolation quantile of an already sorted, `NaN`-free slice.
pub fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Linear-interpolation quantile of the valid values.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    valid.sort_by(f64::total_cmp);
    sorted_quantile(&valid, q)
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Running mean over rows `0..=t`.
pub fn expanding_mean_series(series: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    series
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                sum += v;
                n += 1;
            }
            if n == 0 {
                f64::NAN
            } else {
                sum / n as f64
            }
        })
        .collect()
}

/// Running sample standard deviation over rows `0..=t` (Welford update).
pub fn expanding_std_series(series: &[f64]) -> Vec<f64> {
    let mut n = 0usize;
    let mut mu = 0.0;
    let mut m2 = 0.0;
    series
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                n += 1;
                let delta = v - mu;
                mu += delta / n as f64;
                m2 += delta * (v - mu);
            }
            if n < 2 {
                f64::NAN
            } else {
                (m2 / (n - 1) as f64).sqrt()
            }
        })
        .collect()
}

/// Running quantile over rows `0..=t`.
pub fn expanding_quantile_series(series: &[f64], q: f64) -> Vec<f64> {
    let mut sorted: Vec<f64> = Vec::with_capacity(series.len());
    series
        .iter()
        .map(|&v| {
            if !v.is_nan() {
                let at = sorted.partition_point(|&x| x < v);
                sorted.insert(at, v);
            }
            sorted_quantile(&sorted, q)
        })
        .collect()
}

/// Sample standard deviation over the trailing `window` rows, requiring at
/// least one valid value in the window.
pub fn rolling_std_series(series: &[f64], window: usize) -> Vec<f64> {
    (0..series.len())
        .map(|t| {
            let start = (t + 1).saturating_sub(window);
            sample_std(&series[start..=t])
        })
        .collect()
}

// ─── Frame wrappers ──────────────────────────────────────────────────

pub fn expanding_mean(frame: &Frame) -> Frame {
    frame.map_columns(expanding_mean_series)
}

pub fn expanding_std(frame: &Frame) -> Frame {
    frame.map_columns(expanding_std_series)
}

pub fn expanding_median(frame: &Frame) -> Frame {
    frame.map_columns(|s| expanding_quantile_series(s, 0.5))
}

pub fn expanding_quantile(frame: &Frame, q: f64) -> Result<Frame, FactorError> {
    check_quantile(q)?;
    Ok(frame.map_columns(|s| expanding_quantile_series(s, q)))
}

pub fn rolling_std(frame: &Frame, window: usize) -> Result<Frame, FactorError> {
    if window == 0 {
        return Err(FactorError::InvalidWindow(
            "rolling window must be at least 1".into(),
        ));
    }
    Ok(frame.map_columns(|s| rolling_std_series(s, window)))
}

pub(crate) fn check_quantile(q: f64) -> Result<(), FactorError> {
    if (0.0..=1.0).contains(&q) {
        Ok(())
    } else {
        Err(FactorError::InvalidQuantile { lower: q, upper: q })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};

    const NAN: f64 = f64::NAN;

    #[test]
    fn expanding_mean_skips_nan() {
        let out = expanding_mean_series(&[NAN, 2.0, NAN, 4.0]);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 2.0);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[3], 3.0);
    }

    #[test]
    fn expanding_std_matches_two_pass() {
        let series = [1.0, 4.0, 2.0, 8.0, 5.0];
        let out = expanding_std_series(&series);
        assert!(out[0].is_nan());
        for t in 1..series.len() {
            assert_approx(out[t], sample_std(&series[..=t]), DEFAULT_EPSILON);
        }
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0];
        // positions 0..3, q=0.5 → 1.5 → between 2 and 3
        assert_approx(quantile(&values, 0.5), 2.5, DEFAULT_EPSILON);
        assert_approx(quantile(&values, 0.0), 1.0, DEFAULT_EPSILON);
        assert_approx(quantile(&values, 1.0), 4.0, DEFAULT_EPSILON);
        assert_approx(quantile(&values, 0.25), 1.75, DEFAULT_EPSILON);
        assert!(quantile(&[NAN], 0.5).is_nan());
    }

    #[test]
    fn expanding_quantile_uses_prefix_only() {
        let series = [5.0, 1.0, 3.0, 100.0];
        let out = expanding_quantile_series(&series, 0.5);
        assert_eq!(out[0], 5.0);
        assert_eq!(out[1], 3.0);
        assert_eq!(out[2], 3.0);
        assert_eq!(out[3], 4.0);
    }

    #[test]
    fn rolling_std_min_periods_one() {
        let out = rolling_std_series(&[1.0, 3.0, 5.0, 5.0], 2);
        // single observation → NaN under ddof 1
        assert!(out[0].is_nan());
        assert_approx(out[1], 2.0_f64.sqrt(), DEFAULT_EPSILON);
        assert_approx(out[2], 2.0_f64.sqrt(), DEFAULT_EPSILON);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn rejects_zero_window_and_bad_quantile() {
        let frame = Frame::filled(
            crate::domain::frame::test_dates(2),
            vec!["A".into()],
            1.0,
        )
        .unwrap();
        assert!(matches!(
            rolling_std(&frame, 0),
            Err(FactorError::InvalidWindow(_))
        ));
        assert!(matches!(
            expanding_quantile(&frame, 1.5),
            Err(FactorError::InvalidQuantile { .. })
        ));
    }
}
