//! Microstructure state model: expected volume, spread and depth.
//!
//! Everything here is a pure function of the period index, the variance at
//! that period, the pending trade and the scenario overlay. The pending trade
//! is an explicit argument: the path records the state with no order, and the
//! cost engine re-evaluates each period with that period's own order, so a
//! strategy's trades widen its own spread and thin its own depth without any
//! hidden market state.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::scenario::PeriodOverlay;

/// Participation ratio after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub ratio: f64,
    /// True when the raw ratio exceeded the maximum (or volume was zero).
    pub clamped: bool,
}

/// Market state at one period for a given pending order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureState {
    pub expected_volume: f64,
    pub spread: f64,
    pub depth: f64,
    pub participation: Participation,
}

/// Expected per-period volumes over the trading periods `0..T`.
///
/// Strategies that schedule against volume use the forecast profile, built
/// before any scenario is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    volumes: Vec<f64>,
}

impl VolumeProfile {
    pub fn new(volumes: Vec<f64>) -> Self {
        Self { volumes }
    }

    /// Flat profile: every period expects the same volume.
    pub fn flat(horizon: usize, per_period: f64) -> Self {
        Self::new(vec![per_period; horizon])
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.volumes.iter().sum()
    }
}

/// Stylized intraday liquidity model.
#[derive(Debug, Clone, PartialEq)]
pub struct MicrostructureModel {
    adv: f64,
    base_spread: f64,
    base_depth: f64,
    reference_vol: f64,
    max_participation: f64,
    horizon: usize,
}

impl MicrostructureModel {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            adv: config.market.adv,
            base_spread: config.market.base_spread,
            base_depth: config.market.base_depth,
            reference_vol: config.reference_vol(),
            max_participation: config.market.max_participation,
            horizon: config.horizon,
        }
    }

    /// U-shaped intraday factor `1 + |t/T − 0.5|`: 1.5 at the open and close, 1.0 mid-session.
    pub fn intraday_factor(&self, t: usize) -> f64 {
        1.0 + (t as f64 / self.horizon as f64 - 0.5).abs()
    }

    /// `V(t) = ADV·(1 + |t/T − 0.5|)/T`, times the scenario volume multiplier.
    pub fn expected_volume(&self, t: usize, overlay: &PeriodOverlay) -> f64 {
        self.adv * self.intraday_factor(t) / self.horizon as f64 * overlay.volume_multiplier
    }

    /// `p = min(|q|/V, p_max)`; `p_max` when V is zero and q is not; 0 when q is zero.
    pub fn participation(&self, pending: f64, volume: f64) -> Participation {
        if pending == 0.0 {
            return Participation {
                ratio: 0.0,
                clamped: false,
            };
        }
        if !(volume > 0.0) {
            return Participation {
                ratio: self.max_participation,
                clamped: true,
            };
        }
        let raw = pending.abs() / volume;
        if raw > self.max_participation {
            Participation {
                ratio: self.max_participation,
                clamped: true,
            }
        } else {
            Participation {
                ratio: raw,
                clamped: false,
            }
        }
    }

    /// Evaluate the state at period `t` with variance `variance` and a pending order.
    ///
    /// `variance` is the effective variance, with any scenario volatility
    /// multiplier already applied.
    pub fn evaluate(
        &self,
        t: usize,
        variance: f64,
        pending: f64,
        overlay: &PeriodOverlay,
    ) -> MicrostructureState {
        let expected_volume = self.expected_volume(t, overlay);
        let participation = self.participation(pending, expected_volume);
        let p = participation.ratio;

        let sigma = variance.max(0.0).sqrt();
        let spread = self.base_spread
            * (1.0 + 1.5 * sigma / self.reference_vol)
            * (1.0 + 0.5 * p)
            * overlay.spread_multiplier;
        let depth = self.base_depth * overlay.depth_multiplier / (1.0 + 0.5 * p);

        MicrostructureState {
            expected_volume,
            spread,
            depth,
            participation,
        }
    }

    /// Forecast volumes for the trading periods `0..T` with no scenario applied.
    pub fn forecast_profile(&self) -> VolumeProfile {
        VolumeProfile::new(
            (0..self.horizon)
                .map(|t| self.expected_volume(t, &PeriodOverlay::NEUTRAL))
                .collect(),
        )
    }
}
