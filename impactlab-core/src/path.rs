//! Market path assembly: processes, scenario, microstructure and regimes
//! combined into one immutable `MarketPath`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ConfigError, SimulationConfig};
use crate::diagnostics::NumericalDiagnostics;
use crate::microstructure::{MicrostructureModel, VolumeProfile};
use crate::process::ProcessGenerator;
use crate::regime::{RegimeClassifier, RegimeConfig, RegimeLabel};
use crate::scenario::{PeriodOverlay, ScenarioKind, ScenarioOverlay, ScenarioSpec};

/// Market state at one grid point, recorded with no pending order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodState {
    pub period: usize,
    pub price: f64,
    /// Effective variance (scenario volatility multiplier applied).
    pub variance: f64,
    pub expected_volume: f64,
    pub spread: f64,
    pub depth: f64,
    pub regime: RegimeLabel,
    /// Scenario multipliers in effect, kept so the cost engine can
    /// re-evaluate the microstructure with a pending order.
    pub overlay: PeriodOverlay,
}

impl PeriodState {
    /// σ_t = sqrt(v_t).
    pub fn volatility(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// One realized market path over `horizon + 1` grid points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPath {
    pub path_index: u64,
    pub states: Vec<PeriodState>,
    pub scenario: Option<ScenarioKind>,
    pub diagnostics: NumericalDiagnostics,
}

impl MarketPath {
    /// Number of trading periods T.
    pub fn horizon(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    pub fn state(&self, t: usize) -> Option<&PeriodState> {
        self.states.get(t)
    }

    pub fn arrival_price(&self) -> f64 {
        self.states.first().map(|s| s.price).unwrap_or(0.0)
    }

    pub fn final_price(&self) -> f64 {
        self.states.last().map(|s| s.price).unwrap_or(0.0)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.price).collect()
    }
}

/// Produces market paths for one configuration and optional scenario.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    process: ProcessGenerator,
    microstructure: MicrostructureModel,
    overlay: ScenarioOverlay,
    classifier: RegimeClassifier,
}

impl PathGenerator {
    /// Validate everything up front; `generate` cannot fail afterwards.
    pub fn new(
        config: &SimulationConfig,
        scenario: Option<&ScenarioSpec>,
        regime: RegimeConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = RegimeClassifier::new(regime)?;
        let overlay = ScenarioOverlay::build(scenario, config.horizon)?;
        let process = ProcessGenerator::new(config);
        if !process.satisfies_feller() {
            warn!(
                mean_reversion = config.variance.mean_reversion,
                long_run = config.variance.long_run,
                vol_of_vol = config.variance.vol_of_vol,
                "variance parameters violate the Feller condition; expect truncations"
            );
        }
        Ok(Self {
            process,
            microstructure: MicrostructureModel::new(config),
            overlay,
            classifier,
        })
    }

    pub fn microstructure(&self) -> &MicrostructureModel {
        &self.microstructure
    }

    pub fn overlay(&self) -> &ScenarioOverlay {
        &self.overlay
    }

    /// Forecast volume profile (no scenario) that volume-driven strategies schedule against.
    pub fn forecast_profile(&self) -> VolumeProfile {
        self.microstructure.forecast_profile()
    }

    pub fn generate<R: Rng + ?Sized>(&self, path_index: u64, rng: &mut R) -> MarketPath {
        let raw = self.process.run(&self.overlay, rng);

        let mut classifier = self.classifier.clone();

        let states: Vec<PeriodState> = raw
            .prices
            .iter()
            .zip(&raw.variances)
            .enumerate()
            .map(|(t, (&price, &variance))| {
                let overlay = self.overlay.period(t);
                let micro = self.microstructure.evaluate(t, variance, 0.0, &overlay);
                let regime =
                    classifier.observe(variance.sqrt(), micro.spread, micro.expected_volume);
                PeriodState {
                    period: t,
                    price,
                    variance,
                    expected_volume: micro.expected_volume,
                    spread: micro.spread,
                    depth: micro.depth,
                    regime,
                    overlay,
                }
            })
            .collect();

        if !raw.diagnostics.is_clean() {
            debug!(
                path_index,
                variance_truncations = raw.diagnostics.variance_truncations,
                price_floor_clamps = raw.diagnostics.price_floor_clamps,
                "path generated with numerical clamps"
            );
        }

        MarketPath {
            path_index,
            states,
            scenario: self.overlay.kind(),
            diagnostics: raw.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{RegimeAxis, RegimeLevel};
    use crate::rng::{RngHierarchy, MARKET_STREAM};

    fn generate(spec: Option<&ScenarioSpec>, index: u64) -> MarketPath {
        let config = SimulationConfig::default();
        let generator = PathGenerator::new(&config, spec, RegimeConfig::default()).unwrap();
        let mut rng = RngHierarchy::new(config.seed).rng_for(MARKET_STREAM, index);
        generator.generate(index, &mut rng)
    }

    #[test]
    fn path_has_horizon_plus_one_states() {
        let path = generate(None, 0);
        assert_eq!(path.states.len(), 121);
        assert_eq!(path.horizon(), 120);
        assert_eq!(path.arrival_price(), 100.0);
        assert!(path.scenario.is_none());
        for (t, s) in path.states.iter().enumerate() {
            assert_eq!(s.period, t);
            assert!(s.price > 0.0 && s.variance >= 0.0);
            assert!(s.spread > 0.0 && s.depth > 0.0 && s.expected_volume > 0.0);
        }
    }

    #[test]
    fn regimes_start_after_window() {
        let path = generate(None, 1);
        assert!(path.states[..20]
            .iter()
            .all(|s| s.regime == RegimeLabel::InsufficientHistory));
        assert!(path.states[20..].iter().all(|s| s.regime.is_classified()));
    }

    #[test]
    fn drought_shows_as_low_volume_regime() {
        let spec = ScenarioSpec::new(ScenarioKind::LiquidityDrought, 40, 20, 0.9);
        let path = generate(Some(&spec), 2);
        assert_eq!(path.scenario, Some(ScenarioKind::LiquidityDrought));
        assert_eq!(
            path.states[40].regime.level(RegimeAxis::Volume),
            Some(RegimeLevel::Low)
        );
        assert!((path.states[45].overlay.depth_multiplier - 0.1).abs() < 1e-12);
    }

    #[test]
    fn invalid_scenario_is_rejected_up_front() {
        let spec = ScenarioSpec::new(ScenarioKind::FlashCrash, 500, 10, 0.1);
        let result = PathGenerator::new(
            &SimulationConfig::default(),
            Some(&spec),
            RegimeConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::ScenarioOutsideHorizon { .. })
        ));
    }

    #[test]
    fn feller_violation_still_builds_and_stays_non_negative() {
        let mut config = SimulationConfig::default();
        config.variance.vol_of_vol = 2.0;
        let generator = PathGenerator::new(&config, None, RegimeConfig::default()).unwrap();
        let mut rng = RngHierarchy::new(config.seed).rng_for(MARKET_STREAM, 0);
        let path = generator.generate(0, &mut rng);
        assert!(path.states.iter().all(|s| s.variance >= 0.0));
    }

    #[test]
    fn forecast_profile_ignores_scenario() {
        let config = SimulationConfig::default();
        let calm = PathGenerator::new(&config, None, RegimeConfig::default()).unwrap();
        let spec = ScenarioSpec::liquidity_drought();
        let dry = PathGenerator::new(&config, Some(&spec), RegimeConfig::default()).unwrap();
        assert_eq!(calm.forecast_profile(), dry.forecast_profile());
    }
}
