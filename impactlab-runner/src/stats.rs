//! Distribution summaries of per-path costs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use impactlab_core::stats::{mean, percentile_sorted, sample_std};

/// Percentile bands reported for every cost distribution.
pub const PERCENTILE_BANDS: [f64; 5] = [5.0, 25.0, 50.0, 75.0, 95.0];

/// z-score of the two-sided 95% normal confidence interval.
pub const Z_95: f64 = 1.96;

/// Summary of a cost metric across Monte Carlo paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostDistribution {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// Standard error of the mean, std_dev / sqrt(n).
    pub std_error: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Keyed "p5", "p25", ... "p95".
    pub percentiles: BTreeMap<String, f64>,
    /// 95% confidence interval of the mean.
    pub ci_95: (f64, f64),
    /// 95th percentile of cost.
    pub var_95: f64,
    /// Mean cost at or beyond the 95th percentile.
    pub cvar_95: f64,
}

impl CostDistribution {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                std_dev: 0.0,
                std_error: 0.0,
                median: 0.0,
                min: 0.0,
                max: 0.0,
                percentiles: BTreeMap::new(),
                ci_95: (0.0, 0.0),
                var_95: 0.0,
                cvar_95: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = values.len();
        let mean = mean(values);
        let std_dev = sample_std(values);
        let std_error = std_dev / (n as f64).sqrt();

        let percentiles = PERCENTILE_BANDS
            .iter()
            .map(|p| (format!("p{p}"), percentile_sorted(&sorted, *p)))
            .collect();

        let var_95 = percentile_sorted(&sorted, 95.0);
        let tail: Vec<f64> = sorted.iter().copied().filter(|v| *v >= var_95).collect();
        let cvar_95 = if tail.is_empty() {
            var_95
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };

        Self {
            count: n,
            mean,
            std_dev,
            std_error,
            median: percentile_sorted(&sorted, 50.0),
            min: sorted[0],
            max: sorted[n - 1],
            percentiles,
            ci_95: (mean - Z_95 * std_error, mean + Z_95 * std_error),
            var_95,
            cvar_95,
        }
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles.get(&format!("p{p}")).copied()
    }

    /// Interquartile range (p75 − p25).
    pub fn iqr(&self) -> f64 {
        match (self.percentile(75.0), self.percentile(25.0)) {
            (Some(q3), Some(q1)) => q3 - q1,
            _ => 0.0,
        }
    }
}
