//! Naive execution: the whole order in the first period.

use super::{check_order, ExecutionStrategy, Schedule, StrategyError};
use crate::microstructure::VolumeProfile;

#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

impl ExecutionStrategy for Naive {
    fn name(&self) -> &str {
        "naive"
    }

    fn schedule(
        &self,
        order_size: f64,
        horizon: usize,
        _profile: &VolumeProfile,
    ) -> Result<Schedule, StrategyError> {
        check_order(order_size, horizon)?;
        let mut trades = vec![0.0; horizon];
        trades[0] = order_size;
        Schedule::new(trades, order_size)
    }
}
