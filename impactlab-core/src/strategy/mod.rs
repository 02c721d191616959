//! Execution strategies turn a parent order into a per-period schedule.
//!
//! A strategy sees only the order size, the horizon and the *forecast*
//! volume profile. It never sees the realized path, so every strategy is
//! scored against exactly the market it would have faced without knowing it.

pub mod almgren_chriss;
pub mod naive;
pub mod twap;
pub mod vwap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::microstructure::VolumeProfile;

pub use almgren_chriss::AlmgrenChriss;
pub use naive::Naive;
pub use twap::Twap;
pub use vwap::ScheduledVwap;

/// Relative tolerance on `Σ q_t = Q`.
pub const SCHEDULE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("horizon must be at least 1 period")]
    ZeroHorizon,
    #[error("order size must be finite and non-zero (got {0})")]
    InvalidOrderSize(f64),
    #[error("volume profile covers {actual} periods, expected {expected}")]
    ProfileMismatch { expected: usize, actual: usize },
    #[error("volume profile total must be positive and finite (got {0})")]
    DegenerateProfile(f64),
    #[error("schedule sums to {sum}, expected {target}")]
    Unbalanced { sum: f64, target: f64 },
    #[error("schedule trades against the order direction at period {period} ({trade})")]
    WrongSign { period: usize, trade: f64 },
    #[error("schedule computation failed: {0}")]
    Computation(String),
}

/// Signed per-period trade sizes `q_0..q_{T-1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    trades: Vec<f64>,
    order_size: f64,
}

impl Schedule {
    /// Build a schedule, checking that it sums to `order_size` and never
    /// trades against the order direction.
    pub fn new(trades: Vec<f64>, order_size: f64) -> Result<Self, StrategyError> {
        check_order(order_size, trades.len())?;

        let sum: f64 = trades.iter().sum();
        if !sum.is_finite() || (sum - order_size).abs() > SCHEDULE_TOLERANCE * order_size.abs() {
            return Err(StrategyError::Unbalanced {
                sum,
                target: order_size,
            });
        }

        let slack = SCHEDULE_TOLERANCE * order_size.abs();
        let direction = order_size.signum();
        if let Some((period, &trade)) = trades
            .iter()
            .enumerate()
            .find(|(_, q)| !(**q * direction >= -slack))
        {
            return Err(StrategyError::WrongSign { period, trade });
        }

        Ok(Self { trades, order_size })
    }

    pub fn trades(&self) -> &[f64] {
        &self.trades
    }

    pub fn order_size(&self) -> f64 {
        self.order_size
    }

    pub fn horizon(&self) -> usize {
        self.trades.len()
    }

    /// Remaining holdings `X(0)..X(T)` with `X(0) = Q` and `X(T) = 0`.
    pub fn holdings(&self) -> Vec<f64> {
        let mut remaining = self.order_size;
        let mut out = Vec::with_capacity(self.trades.len() + 1);
        out.push(remaining);
        for q in &self.trades {
            remaining -= q;
            out.push(remaining);
        }
        if let Some(last) = out.last_mut() {
            *last = 0.0;
        }
        out
    }
}

pub(crate) fn check_order(order_size: f64, horizon: usize) -> Result<(), StrategyError> {
    if horizon == 0 {
        return Err(StrategyError::ZeroHorizon);
    }
    if order_size == 0.0 || !order_size.is_finite() {
        return Err(StrategyError::InvalidOrderSize(order_size));
    }
    Ok(())
}

/// Trait for execution strategies.
pub trait ExecutionStrategy: Send + Sync {
    /// Short identifier (e.g. "twap").
    fn name(&self) -> &str;

    /// Split `order_size` over `horizon` periods.
    ///
    /// `profile` is the forecast volume profile; strategies that ignore
    /// volume may ignore it.
    fn schedule(
        &self,
        order_size: f64,
        horizon: usize,
        profile: &VolumeProfile,
    ) -> Result<Schedule, StrategyError>;
}

/// Serializable strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    Naive,
    Twap,
    Vwap,
    AlmgrenChriss { urgency: f64 },
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Naive => "naive",
            StrategyKind::Twap => "twap",
            StrategyKind::Vwap => "vwap",
            StrategyKind::AlmgrenChriss { .. } => "almgren_chriss",
        }
    }

    pub fn build(&self) -> Box<dyn ExecutionStrategy> {
        match *self {
            StrategyKind::Naive => Box::new(Naive),
            StrategyKind::Twap => Box::new(Twap),
            StrategyKind::Vwap => Box::new(ScheduledVwap),
            StrategyKind::AlmgrenChriss { urgency } => Box::new(AlmgrenChriss::new(urgency)),
        }
    }

    /// Naive, TWAP, VWAP and Almgren–Chriss at `urgency`.
    pub fn standard(urgency: f64) -> Vec<StrategyKind> {
        vec![
            StrategyKind::Naive,
            StrategyKind::Twap,
            StrategyKind::Vwap,
            StrategyKind::AlmgrenChriss { urgency },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_rejects_unbalanced_trades() {
        let err = Schedule::new(vec![1.0, 1.0], 3.0).unwrap_err();
        assert!(matches!(err, StrategyError::Unbalanced { .. }));
    }

    #[test]
    fn schedule_rejects_trades_against_direction() {
        let err = Schedule::new(vec![2.0, -1.0], 1.0).unwrap_err();
        assert_eq!(
            err,
            StrategyError::WrongSign {
                period: 1,
                trade: -1.0
            }
        );
    }

    #[test]
    fn holdings_run_from_order_to_zero() {
        let schedule = Schedule::new(vec![50.0, 30.0, 20.0], 100.0).unwrap();
        assert_eq!(schedule.holdings(), vec![100.0, 50.0, 20.0, 0.0]);
        assert_eq!(schedule.horizon(), 3);
    }

    #[test]
    fn sell_schedule_is_valid() {
        let schedule = Schedule::new(vec![-60.0, -40.0], -100.0).unwrap();
        assert_eq!(schedule.holdings(), vec![-100.0, -40.0, 0.0]);
    }

    #[test]
    fn kind_builds_named_strategies() {
        for kind in StrategyKind::standard(3.0) {
            assert_eq!(kind.build().name(), kind.name());
        }
    }

    #[test]
    fn kind_serde_is_tagged() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"type":"almgren_chriss","urgency":5.0}"#).unwrap();
        assert_eq!(kind, StrategyKind::AlmgrenChriss { urgency: 5.0 });
        let json = serde_json::to_string(&StrategyKind::Twap).unwrap();
        assert_eq!(json, r#"{"type":"twap"}"#);
    }
}
