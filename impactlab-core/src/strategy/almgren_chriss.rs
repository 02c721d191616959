//! Almgren–Chriss optimal liquidation trajectory.
//!
//! Holdings follow `X(t) = Q·sinh(u(T−t)/T)/sinh(u)` where `u = κT` is the
//! urgency. Large `u` front-loads execution; `u → 0` recovers TWAP.
//!
//! For `u > 1` the ratio is evaluated as
//! `e^{a−u}·(1 − e^{−2a})/(1 − e^{−2u})` with `a = u(T−t)/T`, which stays
//! finite where `sinh(u)` itself overflows.

use super::{check_order, ExecutionStrategy, Schedule, StrategyError};
use crate::microstructure::VolumeProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlmgrenChriss {
    pub urgency: f64,
}

impl AlmgrenChriss {
    pub fn new(urgency: f64) -> Self {
        Self { urgency }
    }

    /// Remaining holdings `X(0)..X(T)`, exactly `Q` and `0` at the ends.
    pub fn holdings(&self, order_size: f64, horizon: usize) -> Result<Vec<f64>, StrategyError> {
        check_order(order_size, horizon)?;
        let u = self.urgency;
        if !u.is_finite() || u < 0.0 {
            return Err(StrategyError::Computation(format!(
                "urgency must be finite and non-negative (got {u})"
            )));
        }

        let n = horizon as f64;
        let mut holdings = Vec::with_capacity(horizon + 1);
        for t in 0..=horizon {
            let frac = (horizon - t) as f64 / n;
            let x = order_size * sinh_ratio(frac, u);
            if !x.is_finite() {
                return Err(StrategyError::Computation(format!(
                    "non-finite holdings at period {t} (urgency {u})"
                )));
            }
            holdings.push(x);
        }
        holdings[0] = order_size;
        holdings[horizon] = 0.0;
        Ok(holdings)
    }
}

/// `sinh(u·frac)/sinh(u)` for `frac ∈ [0, 1]`; the `u = 0` limit is `frac`.
fn sinh_ratio(frac: f64, u: f64) -> f64 {
    if u == 0.0 {
        return frac;
    }
    let a = u * frac;
    if u > 1.0 {
        (a - u).exp() * (-(-2.0 * a).exp_m1()) / (-(-2.0 * u).exp_m1())
    } else {
        a.sinh() / u.sinh()
    }
}

impl ExecutionStrategy for AlmgrenChriss {
    fn name(&self) -> &str {
        "almgren_chriss"
    }

    fn schedule(
        &self,
        order_size: f64,
        horizon: usize,
        _profile: &VolumeProfile,
    ) -> Result<Schedule, StrategyError> {
        let holdings = self.holdings(order_size, horizon)?;
        let trades = holdings.windows(2).map(|w| w[0] - w[1]).collect();
        Schedule::new(trades, order_size)
    }
}
