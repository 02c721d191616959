//! Time-weighted average price: equal slices every period.

use super::{check_order, ExecutionStrategy, Schedule, StrategyError};
use crate::microstructure::VolumeProfile;

#[derive(Debug, Clone, Copy, Default)]
pub struct Twap;

impl ExecutionStrategy for Twap {
    fn name(&self) -> &str {
        "twap"
    }

    fn schedule(
        &self,
        order_size: f64,
        horizon: usize,
        _profile: &VolumeProfile,
    ) -> Result<Schedule, StrategyError> {
        check_order(order_size, horizon)?;
        let slice = order_size / horizon as f64;
        Schedule::new(vec![slice; horizon], order_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_slices() {
        let s = Twap
            .schedule(100_000.0, 120, &VolumeProfile::flat(120, 1.0))
            .unwrap();
        assert!(s.trades().iter().all(|q| *q == 100_000.0 / 120.0));
    }

    #[test]
    fn sells_are_negative_slices() {
        let s = Twap
            .schedule(-300.0, 3, &VolumeProfile::flat(3, 1.0))
            .unwrap();
        assert_eq!(s.trades(), &[-100.0, -100.0, -100.0]);
    }

    #[test]
    fn zero_order_rejected() {
        assert_eq!(
            Twap.schedule(0.0, 3, &VolumeProfile::flat(3, 1.0)),
            Err(StrategyError::InvalidOrderSize(0.0))
        );
    }
}
