//! Cost decomposition. Scores one schedule against one market path.
//!
//! Five components, all non-negative, summing exactly to the total:
//! - spread: half the (order-widened) spread on every share traded
//! - temporary impact: concave in participation, decayed toward the horizon
//! - permanent impact: concave in the parent order's share of ADV
//! - implementation shortfall: `max(0, (VWAP − S₀)·Q)`
//! - adverse selection: `max(0, −(S_T − VWAP)·Q)`
//!
//! Order size is signed, so the last two flip automatically for sells. The
//! unclipped values are kept alongside for signed aggregation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::config::{ImpactParams, SimulationConfig};
use crate::microstructure::MicrostructureModel;
use crate::path::MarketPath;
use crate::strategy::Schedule;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostError {
    #[error("schedule covers {schedule} periods but the path has {path}")]
    HorizonMismatch { path: usize, schedule: usize },
    #[error("{0} cost is not finite")]
    NonFinite(&'static str),
}

/// How the temporary impact decay weight is computed for a trade at period t.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporaryDecay {
    /// `e^{−λ(T−t)}`: impact still outstanding at the horizon.
    #[default]
    Terminal,
    /// `(1 − e^{−λR})/(λR)` with `R = T − t`: mean impact over the remaining horizon.
    Averaged,
}

impl TemporaryDecay {
    pub fn weight(&self, lambda: f64, remaining: f64) -> f64 {
        let x = lambda * remaining;
        match self {
            TemporaryDecay::Terminal => (-x).exp(),
            TemporaryDecay::Averaged => {
                if x < 1e-12 {
                    1.0
                } else {
                    -(-x).exp_m1() / x
                }
            }
        }
    }
}

/// Whether shortfall and adverse selection enter totals clipped at zero or signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallMode {
    #[default]
    Clipped,
    Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostComponent {
    Spread,
    Temporary,
    Permanent,
    ImplementationShortfall,
    AdverseSelection,
}

impl CostComponent {
    pub fn name(&self) -> &'static str {
        match self {
            CostComponent::Spread => "spread",
            CostComponent::Temporary => "temporary",
            CostComponent::Permanent => "permanent",
            CostComponent::ImplementationShortfall => "implementation_shortfall",
            CostComponent::AdverseSelection => "adverse_selection",
        }
    }

    pub fn all() -> [CostComponent; 5] {
        [
            CostComponent::Spread,
            CostComponent::Temporary,
            CostComponent::Permanent,
            CostComponent::ImplementationShortfall,
            CostComponent::AdverseSelection,
        ]
    }
}

/// Spread and temporary impact paid at one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodCost {
    pub period: usize,
    pub trade: f64,
    pub participation: f64,
    pub spread: f64,
    pub temporary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub spread: f64,
    pub temporary: f64,
    pub permanent: f64,
    pub implementation_shortfall: f64,
    pub adverse_selection: f64,
    /// Exact sum of the five clipped components.
    pub total: f64,
    /// `(VWAP − S₀)·Q` before clipping.
    pub signed_shortfall: f64,
    /// `−(S_T − VWAP)·Q` before clipping.
    pub signed_adverse_selection: f64,
    pub realized_vwap: f64,
    /// Arrival notional `S₀·|Q|`.
    pub notional: f64,
    pub participation_clamps: usize,
    pub periods: Vec<PeriodCost>,
}

impl CostBreakdown {
    pub fn component(&self, component: CostComponent) -> f64 {
        match component {
            CostComponent::Spread => self.spread,
            CostComponent::Temporary => self.temporary,
            CostComponent::Permanent => self.permanent,
            CostComponent::ImplementationShortfall => self.implementation_shortfall,
            CostComponent::AdverseSelection => self.adverse_selection,
        }
    }

    pub fn total_with(&self, mode: ShortfallMode) -> f64 {
        match mode {
            ShortfallMode::Clipped => self.total,
            ShortfallMode::Signed => {
                self.spread
                    + self.temporary
                    + self.permanent
                    + self.signed_shortfall
                    + self.signed_adverse_selection
            }
        }
    }

    /// A cost in basis points of arrival notional.
    pub fn bps(&self, value: f64) -> f64 {
        if self.notional > 0.0 {
            value / self.notional * 10_000.0
        } else {
            0.0
        }
    }

    pub fn total_bps(&self) -> f64 {
        self.bps(self.total)
    }
}

/// Scores schedules against market paths.
#[derive(Debug, Clone)]
pub struct CostModel {
    impact: ImpactParams,
    adv: f64,
    microstructure: MicrostructureModel,
}

impl CostModel {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            impact: config.impact.clone(),
            adv: config.market.adv,
            microstructure: MicrostructureModel::new(config),
        }
    }

    pub fn score(&self, path: &MarketPath, schedule: &Schedule) -> Result<CostBreakdown, CostError> {
        let horizon = schedule.horizon();
        if path.horizon() != horizon {
            return Err(CostError::HorizonMismatch {
                path: path.horizon(),
                schedule: horizon,
            });
        }

        let order = schedule.order_size();
        let arrival = path.arrival_price();
        let lambda = self.impact.decay_rate();

        let mut periods = Vec::with_capacity(horizon);
        let mut spread_total = 0.0;
        let mut temporary_total = 0.0;
        let mut traded = 0.0;
        let mut traded_value = 0.0;
        let mut participation_clamps = 0;

        for (t, (&q, state)) in schedule.trades().iter().zip(&path.states).enumerate() {
            let micro = self
                .microstructure
                .evaluate(t, state.variance, q, &state.overlay);
            if micro.participation.clamped {
                participation_clamps += 1;
                trace!(period = t, trade = q, "participation clamped");
            }
            let p = micro.participation.ratio;
            let size = q.abs();

            let spread = 0.5 * micro.spread * size;
            let temporary = self.impact.gamma
                * p.powf(self.impact.alpha)
                * state.volatility()
                * state.price
                * size
                * self.impact.decay.weight(lambda, (horizon - t) as f64);

            spread_total += spread;
            temporary_total += temporary;
            traded += size;
            traded_value += size * state.price;
            periods.push(PeriodCost {
                period: t,
                trade: q,
                participation: p,
                spread,
                temporary,
            });
        }

        let permanent = self.impact.eta
            * (order.abs() / self.adv).powf(self.impact.beta)
            * arrival
            * order.abs();

        let vwap = if traded > 0.0 {
            traded_value / traded
        } else {
            arrival
        };
        let signed_shortfall = (vwap - arrival) * order;
        let signed_adverse_selection = -(path.final_price() - vwap) * order;
        let implementation_shortfall = signed_shortfall.max(0.0);
        let adverse_selection = signed_adverse_selection.max(0.0);

        let total =
            spread_total + temporary_total + permanent + implementation_shortfall + adverse_selection;
        if !total.is_finite() {
            return Err(CostError::NonFinite("total"));
        }

        Ok(CostBreakdown {
            spread: spread_total,
            temporary: temporary_total,
            permanent,
            implementation_shortfall,
            adverse_selection,
            total,
            signed_shortfall,
            signed_adverse_selection,
            realized_vwap: vwap,
            notional: arrival * order.abs(),
            participation_clamps,
            periods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NumericalDiagnostics;
    use crate::microstructure::VolumeProfile;
    use crate::path::PeriodState;
    use crate::regime::RegimeLabel;
    use crate::scenario::PeriodOverlay;
    use crate::strategy::{ExecutionStrategy, Naive, Twap};

    fn path_from_prices(config: &SimulationConfig, prices: &[f64]) -> MarketPath {
        let micro = MicrostructureModel::new(config);
        let variance = config.variance.long_run;
        let states = prices
            .iter()
            .enumerate()
            .map(|(t, &price)| {
                let m = micro.evaluate(t, variance, 0.0, &PeriodOverlay::NEUTRAL);
                PeriodState {
                    period: t,
                    price,
                    variance,
                    expected_volume: m.expected_volume,
                    spread: m.spread,
                    depth: m.depth,
                    regime: RegimeLabel::InsufficientHistory,
                    overlay: PeriodOverlay::NEUTRAL,
                }
            })
            .collect();
        MarketPath {
            path_index: 0,
            states,
            scenario: None,
            diagnostics: NumericalDiagnostics::default(),
        }
    }

    fn flat_path(config: &SimulationConfig) -> MarketPath {
        path_from_prices(config, &vec![100.0; config.horizon + 1])
    }

    fn profile(config: &SimulationConfig) -> VolumeProfile {
        MicrostructureModel::new(config).forecast_profile()
    }

    #[test]
    fn naive_on_flat_path_matches_hand_computation() {
        let config = SimulationConfig::default();
        let schedule = Naive
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let costs = CostModel::new(&config)
            .score(&flat_path(&config), &schedule)
            .unwrap();

        // V_0 = 12 500, p = 8, spread = 0.02·2.5·(1 + 4) = 0.25
        assert!((costs.spread - 0.5 * 0.25 * 100_000.0).abs() < 1e-6);
        let temporary = 0.1 * 8f64.powf(0.65) * 0.02 * 100.0 * 100_000.0 * 2f64.powi(-12);
        assert!((costs.temporary - temporary).abs() < 1e-6);
        let permanent = 0.03 * 0.1f64.powf(0.42) * 100.0 * 100_000.0;
        assert!((costs.permanent - permanent).abs() < 1e-6);
        assert_eq!(costs.implementation_shortfall, 0.0);
        assert_eq!(costs.adverse_selection, 0.0);
        assert_eq!(costs.realized_vwap, 100.0);
    }

    #[test]
    fn total_is_exact_sum() {
        let config = SimulationConfig::default();
        let schedule = Twap
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let prices: Vec<f64> = (0..=config.horizon).map(|t| 100.0 + 0.01 * t as f64).collect();
        let costs = CostModel::new(&config)
            .score(&path_from_prices(&config, &prices), &schedule)
            .unwrap();
        let sum = CostComponent::all()
            .iter()
            .map(|c| costs.component(*c))
            .sum::<f64>();
        assert_eq!(costs.total, sum);
        assert!(costs.implementation_shortfall > 0.0);
        assert_eq!(costs.adverse_selection, 0.0);
    }

    #[test]
    fn falling_market_after_buy_is_adverse_selection() {
        let config = SimulationConfig::default();
        let schedule = Naive
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let mut prices = vec![100.0; config.horizon + 1];
        prices[config.horizon] = 95.0;
        let costs = CostModel::new(&config)
            .score(&path_from_prices(&config, &prices), &schedule)
            .unwrap();
        assert!((costs.adverse_selection - 500_000.0).abs() < 1e-6);
        assert_eq!(costs.signed_adverse_selection, costs.adverse_selection);
    }

    #[test]
    fn sell_side_flips_signs() {
        let config = SimulationConfig {
            order_size: -100_000.0,
            ..SimulationConfig::default()
        };
        let schedule = Twap
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        // Falling prices hurt a seller; the close recovers above the VWAP.
        let mut prices: Vec<f64> = (0..=config.horizon).map(|t| 100.0 - 0.01 * t as f64).collect();
        prices[config.horizon] = 100.0;
        let costs = CostModel::new(&config)
            .score(&path_from_prices(&config, &prices), &schedule)
            .unwrap();
        assert!(costs.implementation_shortfall > 0.0);
        assert!(costs.adverse_selection > 0.0);
        assert!(costs.spread > 0.0 && costs.temporary > 0.0 && costs.permanent > 0.0);
    }

    #[test]
    fn signed_mode_can_credit_favourable_drift() {
        let config = SimulationConfig::default();
        let schedule = Naive
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let mut prices = vec![100.0; config.horizon + 1];
        prices[config.horizon] = 101.0;
        let costs = CostModel::new(&config)
            .score(&path_from_prices(&config, &prices), &schedule)
            .unwrap();
        assert_eq!(costs.adverse_selection, 0.0);
        assert!(costs.signed_adverse_selection < 0.0);
        assert!(costs.total_with(ShortfallMode::Signed) < costs.total_with(ShortfallMode::Clipped));
    }

    #[test]
    fn horizon_mismatch_is_an_error() {
        let config = SimulationConfig::default();
        let schedule = Twap.schedule(1000.0, 10, &VolumeProfile::flat(10, 1.0)).unwrap();
        assert_eq!(
            CostModel::new(&config).score(&flat_path(&config), &schedule),
            Err(CostError::HorizonMismatch {
                path: 120,
                schedule: 10
            })
        );
    }

    #[test]
    fn bps_relative_to_arrival_notional() {
        let config = SimulationConfig::default();
        let schedule = Twap
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let costs = CostModel::new(&config)
            .score(&flat_path(&config), &schedule)
            .unwrap();
        assert_eq!(costs.notional, 10_000_000.0);
        assert!((costs.total_bps() - costs.total / 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn decay_weights() {
        let lambda = std::f64::consts::LN_2 / 10.0;
        assert!((TemporaryDecay::Terminal.weight(lambda, 10.0) - 0.5).abs() < 1e-12);
        let avg = TemporaryDecay::Averaged.weight(lambda, 10.0);
        assert!(avg > 0.5 && avg < 1.0);
        assert_eq!(TemporaryDecay::Averaged.weight(lambda, 0.0), 1.0);
    }

    #[test]
    fn clamped_participation_is_counted() {
        let config = SimulationConfig {
            market: crate::config::MarketParams {
                max_participation: 2.0,
                ..Default::default()
            },
            ..SimulationConfig::default()
        };
        let schedule = Naive
            .schedule(config.order_size, config.horizon, &profile(&config))
            .unwrap();
        let costs = CostModel::new(&config)
            .score(&flat_path(&config), &schedule)
            .unwrap();
        assert_eq!(costs.participation_clamps, 1);
        assert_eq!(costs.periods[0].participation, 2.0);
    }
}
