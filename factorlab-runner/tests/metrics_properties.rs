//! Property tests for the performance metrics over arbitrary positive
//! total-value series.

use factorlab_runner::metrics::{cagr, daily_returns, max_drawdown, sharpe_ratio, total_return};
use proptest::prelude::*;

fn arb_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1e6, 2..200)
}

proptest! {
    #[test]
    fn max_drawdown_is_a_bounded_loss(values in arb_values()) {
        let dd = max_drawdown(&values);
        prop_assert!((-1.0..=0.0).contains(&dd), "drawdown {dd} out of range");
    }

    #[test]
    fn max_drawdown_zero_for_non_decreasing(mut values in arb_values()) {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        prop_assert_eq!(max_drawdown(&values), 0.0);
    }

    #[test]
    fn total_return_matches_end_points(values in arb_values()) {
        let first = values[0];
        let last = values[values.len() - 1];
        let expected = last / first - 1.0;
        let tr = total_return(&values);
        prop_assert!(
            (tr - expected).abs() <= 1e-9 * expected.abs().max(1.0),
            "total return {tr} vs {expected}"
        );
    }

    #[test]
    fn cagr_sign_follows_total_return(values in arb_values()) {
        let tr = total_return(&values);
        let g = cagr(&values);
        if tr > 1e-12 {
            prop_assert!(g > 0.0);
        } else if tr < -1e-12 {
            prop_assert!(g < 0.0);
        }
    }

    #[test]
    fn one_return_per_step_and_finite_sharpe(values in arb_values()) {
        prop_assert_eq!(daily_returns(&values).len(), values.len() - 1);
        prop_assert!(sharpe_ratio(&values, 0.0).is_finite());
    }
}
