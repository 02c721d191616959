//! Counters for the numerical safeguards applied during simulation.
//!
//! Clamps are never errors; they are counted here and surfaced in the
//! Monte Carlo result so a run with pathological parameters is visible.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericalDiagnostics {
    /// Variance steps that went negative and were truncated to zero.
    pub variance_truncations: usize,
    /// Prices clamped to the configured floor.
    pub price_floor_clamps: usize,
    /// Participation ratios clamped to the configured maximum.
    pub participation_clamps: usize,
}

impl NumericalDiagnostics {
    pub fn merge(&mut self, other: &NumericalDiagnostics) {
        self.variance_truncations += other.variance_truncations;
        self.price_floor_clamps += other.price_floor_clamps;
        self.participation_clamps += other.participation_clamps;
    }

    pub fn total(&self) -> usize {
        self.variance_truncations + self.price_floor_clamps + self.participation_clamps
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Clamps per simulated period, given how many periods were stepped.
    pub fn clamp_rate(&self, periods: usize) -> f64 {
        if periods == 0 {
            return 0.0;
        }
        self.total() as f64 / periods as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_fieldwise() {
        let mut a = NumericalDiagnostics {
            variance_truncations: 1,
            price_floor_clamps: 2,
            participation_clamps: 3,
        };
        a.merge(&NumericalDiagnostics {
            variance_truncations: 10,
            price_floor_clamps: 0,
            participation_clamps: 1,
        });
        assert_eq!(a.variance_truncations, 11);
        assert_eq!(a.price_floor_clamps, 2);
        assert_eq!(a.participation_clamps, 4);
        assert_eq!(a.total(), 17);
    }

    #[test]
    fn clamp_rate_handles_zero_periods() {
        let d = NumericalDiagnostics::default();
        assert!(d.is_clean());
        assert_eq!(d.clamp_rate(0), 0.0);
        let d = NumericalDiagnostics {
            variance_truncations: 5,
            ..Default::default()
        };
        assert_eq!(d.clamp_rate(100), 0.05);
    }
}
