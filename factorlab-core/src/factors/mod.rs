//! Factor library: pure transforms over date × symbol tables.
//!
//! Every function takes a `Frame` and returns a new `Frame` of the same shape
//! (except `merge`). Columns are independent and processed in parallel.
//! Expanding statistics at row `t` read rows `0..=t` only, so a factor value
//! never depends on later prices. `full_winsorize` is the one documented
//! exception.

pub mod merge;
pub mod momentum;
pub mod returns;
pub mod standardize;
pub mod stats;
pub mod volatility;
pub mod winsorize;

use crate::domain::FrameError;
use thiserror::Error;

pub use merge::merge;
pub use momentum::{mean_reversion, momentum};
pub use returns::{pct_change, shift, total_return_index};
pub use standardize::{standardize, Standardization};
pub use stats::{expanding_mean, expanding_median, expanding_quantile, expanding_std, rolling_std};
pub use volatility::volatility;
pub use winsorize::{full_winsorize, winsorize};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactorError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("quantile bounds must satisfy 0 <= lower <= upper <= 1 (got {lower}, {upper})")]
    InvalidQuantile { lower: f64, upper: f64 },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub(crate) fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub(crate) const DEFAULT_EPSILON: f64 = 1e-10;
