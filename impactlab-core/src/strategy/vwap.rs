//! Scheduled VWAP: trade in proportion to the forecast volume profile.
//!
//! The schedule is fixed up front from the forecast and never adapts to the
//! volume the path actually delivers.

use super::{check_order, ExecutionStrategy, Schedule, StrategyError};
use crate::microstructure::VolumeProfile;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduledVwap;

impl ExecutionStrategy for ScheduledVwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn schedule(
        &self,
        order_size: f64,
        horizon: usize,
        profile: &VolumeProfile,
    ) -> Result<Schedule, StrategyError> {
        check_order(order_size, horizon)?;
        if profile.len() != horizon {
            return Err(StrategyError::ProfileMismatch {
                expected: horizon,
                actual: profile.len(),
            });
        }
        let total = profile.total();
        if !(total > 0.0) || !total.is_finite() {
            return Err(StrategyError::DegenerateProfile(total));
        }
        if profile.volumes().iter().any(|v| *v < 0.0) {
            return Err(StrategyError::DegenerateProfile(total));
        }

        let trades = profile
            .volumes()
            .iter()
            .map(|v| order_size * v / total)
            .collect();
        Schedule::new(trades, order_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_to_profile() {
        let profile = VolumeProfile::new(vec![3.0, 1.0, 1.0, 3.0]);
        let s = ScheduledVwap.schedule(800.0, 4, &profile).unwrap();
        assert_eq!(s.trades(), &[300.0, 100.0, 100.0, 300.0]);
    }

    #[test]
    fn mismatched_profile_rejected() {
        let profile = VolumeProfile::flat(3, 1.0);
        assert_eq!(
            ScheduledVwap.schedule(100.0, 4, &profile),
            Err(StrategyError::ProfileMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn all_zero_profile_rejected() {
        let profile = VolumeProfile::flat(3, 0.0);
        assert!(matches!(
            ScheduledVwap.schedule(100.0, 3, &profile),
            Err(StrategyError::DegenerateProfile(_))
        ));
    }
}
