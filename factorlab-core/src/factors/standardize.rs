//! Standardization of factor tables.
//!
//! Time-series: (x[t] - center(x[0..=t])) / std(x[0..=t]) per column. The
//! result is not guaranteed to have zero mean and unit variance, but row `t`
//! never sees later rows.
//!
//! Cross-sectional: (x - center(row)) / std(row) per date. Uses the whole row
//! of that date only, so there is no leakage across time either.

use super::stats::{
    expanding_mean_series, expanding_quantile_series, expanding_std_series, mean, median,
    sample_std,
};
use crate::domain::Frame;
use serde::{Deserialize, Serialize};

/// Which axis to standardize along, and whether to center on the median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Standardization {
    TimeSeries { use_median: bool },
    CrossSectional { use_median: bool },
}

impl Default for Standardization {
    fn default() -> Self {
        Standardization::TimeSeries { use_median: false }
    }
}

pub fn standardize(frame: &Frame, kind: Standardization) -> Frame {
    match kind {
        Standardization::TimeSeries { use_median } => {
            frame.map_columns(|s| time_series_zscore(s, use_median))
        }
        Standardization::CrossSectional { use_median } => frame.map_rows(|row| {
            let center = if use_median { median(row) } else { mean(row) };
            let scale = sample_std(row);
            row.iter().map(|v| (v - center) / scale).collect()
        }),
    }
}

/// Expanding z-score of one series.
pub fn time_series_zscore(series: &[f64], use_median: bool) -> Vec<f64> {
    let center = if use_median {
        expanding_quantile_series(series, 0.5)
    } else {
        expanding_mean_series(series)
    };
    let scale = expanding_std_series(series);
    series
        .iter()
        .zip(center.iter().zip(&scale))
        .map(|(x, (c, s))| (x - c) / s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_dates;
    use crate::factors::{assert_approx, DEFAULT_EPSILON};

    fn frame() -> Frame {
        Frame::from_rows(
            test_dates(3),
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![2.0, 4.0, 9.0],
                vec![4.0, 6.0, 5.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn time_series_first_rows_undefined() {
        let z = standardize(&frame(), Standardization::default());
        assert!(z.get(0, 0).is_nan());
        // column A after 2 rows: mean 1.5, std sqrt(0.5)
        assert_approx(z.get(1, 0), 0.5 / 0.5_f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn time_series_median_center() {
        let z = time_series_zscore(&[1.0, 2.0, 9.0], true);
        // median of [1,2,9] is 2, sample std is sqrt(19)
        assert_approx(z[2], 7.0 / 19.0_f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn cross_sectional_rows_are_centered() {
        let z = standardize(&frame(), Standardization::CrossSectional { use_median: false });
        for r in 0..3 {
            let row_sum: f64 = z.row(r).iter().sum();
            assert_approx(row_sum, 0.0, 1e-9);
        }
        // row 0: mean 2, std 1
        assert_eq!(z.row(0), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn cross_sectional_median_center() {
        let z = standardize(&frame(), Standardization::CrossSectional { use_median: true });
        // row 1: median 4, std of [2,4,9] = sqrt(13)
        assert_approx(z.get(1, 2), 5.0 / 13.0_f64.sqrt(), DEFAULT_EPSILON);
    }
}
