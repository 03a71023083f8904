//! Performance metrics: pure functions over the account ledger.
//!
//! Every metric is a pure function: total-value series in, scalar out.
//! Total value is `equities + cash`, so a long/short book with negative
//! equities is measured correctly.

use factorlab_core::engine::AccountLedger;
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub min_cash: f64,
    pub trading_days: usize,
}

impl PerformanceMetrics {
    pub fn compute(account: &AccountLedger) -> Self {
        let values = account.total_value();
        let min_cash = account
            .rows()
            .iter()
            .map(|r| r.cash)
            .fold(f64::INFINITY, f64::min);
        Self {
            initial_value: values.first().copied().unwrap_or(0.0),
            final_value: values.last().copied().unwrap_or(0.0),
            total_return: total_return(&values),
            cagr: cagr(&values),
            sharpe: sharpe_ratio(&values, 0.0),
            max_drawdown: max_drawdown(&values),
            min_cash: if min_cash.is_finite() { min_cash } else { 0.0 },
            trading_days: values.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&initial), Some(&last)) if values.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate over `values.len()` trading days.
///
/// Returns 0.0 for a single row or a non-positive start or end value.
pub fn cagr(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&initial), Some(&last)) if values.len() >= 2 && initial > 0.0 && last > 0.0 => {
            let years = values.len() as f64 / TRADING_DAYS_PER_YEAR;
            (last / initial).powf(1.0 / years) - 1.0
        }
        _ => 0.0,
    }
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf) / std(daily returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(values: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let mean = excess.iter().sum::<f64>() / excess.len() as f64;
    let var = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (excess.len() - 1) as f64;
    let std = var.sqrt();
    if std < 1e-15 {
        return 0.0;
    }
    mean / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            max_dd = max_dd.min((v - peak) / peak);
        }
    }
    max_dd
}

/// Simple daily returns; a non-positive prior value yields no return.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_return_and_cagr() {
        let values = vec![100.0, 110.0, 121.0];
        assert!((total_return(&values) - 0.21).abs() < 1e-12);
        // 3 rows of a 252-day year
        let expected = 1.21_f64.powf(252.0 / 3.0) - 1.0;
        assert!((cagr(&values) - expected).abs() < 1e-9 * expected);
        assert_eq!(cagr(&[100.0]), 0.0);
        assert_eq!(cagr(&[100.0, -5.0]), 0.0);
    }

    #[test]
    fn sharpe_zero_for_constant_growth() {
        let values: Vec<f64> = (0..10).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        // identical returns → zero variance
        assert_eq!(sharpe_ratio(&values, 0.0), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_mean_return() {
        let up = [100.0, 102.0, 101.0, 104.0, 103.0, 107.0];
        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert!(sharpe_ratio(&up, 0.0) > 0.0);
        assert!(sharpe_ratio(&down, 0.0) < 0.0);
    }

    #[test]
    fn max_drawdown_is_negative_fraction() {
        let values = [100.0, 120.0, 90.0, 130.0, 117.0];
        assert!((max_drawdown(&values) + 0.25).abs() < 1e-12);
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }
}
