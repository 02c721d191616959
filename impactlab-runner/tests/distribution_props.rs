//! Property tests for cost distribution summaries.

use impactlab_runner::{risk_adjusted_savings, CostDistribution};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ── 1. Ordering of summary statistics ──

    #[test]
    fn percentiles_are_ordered(values in prop::collection::vec(0.0f64..1e7, 1..200)) {
        let d = CostDistribution::from_values(&values);
        let bands: Vec<f64> = [5.0, 25.0, 50.0, 75.0, 95.0]
            .iter()
            .map(|p| d.percentile(*p).unwrap())
            .collect();
        prop_assert!(d.min <= bands[0]);
        for pair in bands.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(bands[4] <= d.max);
        prop_assert!(d.cvar_95 >= d.var_95 - 1e-6);
        prop_assert!(d.mean >= d.min - 1e-6 && d.mean <= d.max + 1e-6);
    }

    // ── 2. Confidence interval ──

    #[test]
    fn interval_is_centred_on_mean(values in prop::collection::vec(-1e6f64..1e6, 2..200)) {
        let d = CostDistribution::from_values(&values);
        let (lo, hi) = d.ci_95;
        prop_assert!(lo <= d.mean && d.mean <= hi);
        prop_assert!(((hi - d.mean) - (d.mean - lo)).abs() < 1e-6);
    }

    // ── 3. Risk-adjusted savings ──

    #[test]
    fn savings_sign_follows_mean_difference(
        base in 0.0f64..1e6,
        mean in 0.0f64..1e6,
        std in 1e-6f64..1e5,
    ) {
        let s = risk_adjusted_savings(base, mean, std);
        prop_assert_eq!(s > 0.0, base > mean);
    }
}
