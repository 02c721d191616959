//! ImpactLab Core — stochastic market simulator and execution cost engine.
//!
//! This crate contains everything needed to simulate and score one path:
//! - Ornstein–Uhlenbeck price and Heston/CIR variance processes
//! - Microstructure state (expected volume, spread, depth) with pending-order feedback
//! - Scenario injection (flash crash, liquidity drought, momentum drift)
//! - Rolling-window regime classification
//! - Execution strategies (Naive, TWAP, scheduled VWAP, Almgren–Chriss)
//! - Five-component cost decomposition

pub mod config;
pub mod cost;
pub mod diagnostics;
pub mod microstructure;
pub mod path;
pub mod process;
pub mod regime;
pub mod rng;
pub mod scenario;
pub mod stats;
pub mod strategy;

pub use config::{ConfigError, SimulationConfig};
pub use cost::{CostBreakdown, CostComponent, CostError, CostModel, ShortfallMode, TemporaryDecay};
pub use diagnostics::NumericalDiagnostics;
pub use microstructure::{MicrostructureModel, MicrostructureState, VolumeProfile};
pub use path::{MarketPath, PathGenerator, PeriodState};
pub use regime::{RegimeAxis, RegimeClassifier, RegimeConfig, RegimeLabel, RegimeLevel};
pub use rng::RngHierarchy;
pub use scenario::{ScenarioKind, ScenarioOverlay, ScenarioSpec};
pub use strategy::{ExecutionStrategy, Schedule, StrategyError, StrategyKind};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across rayon workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<SimulationConfig>();
        require_sync::<SimulationConfig>();
        require_send::<ScenarioSpec>();
        require_sync::<ScenarioSpec>();
        require_send::<RegimeConfig>();
        require_sync::<RegimeConfig>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();

        require_send::<PathGenerator>();
        require_sync::<PathGenerator>();
        require_send::<CostModel>();
        require_sync::<CostModel>();
        require_send::<MarketPath>();
        require_sync::<MarketPath>();
        require_send::<Schedule>();
        require_sync::<Schedule>();
        require_send::<CostBreakdown>();
        require_sync::<CostBreakdown>();

        require_send::<Box<dyn ExecutionStrategy>>();
        require_sync::<Box<dyn ExecutionStrategy>>();
    }

    /// Strategies schedule from the forecast profile only; the realized path
    /// is not an argument, so a strategy cannot peek at it.
    #[test]
    fn strategy_trait_has_no_path_parameter() {
        fn schedule_through_trait_object(
            strategy: &dyn ExecutionStrategy,
            profile: &VolumeProfile,
        ) -> Result<Schedule, StrategyError> {
            strategy.schedule(100.0, 4, profile)
        }

        let profile = VolumeProfile::flat(4, 1_000.0);
        for kind in StrategyKind::standard(2.0) {
            let schedule = schedule_through_trait_object(kind.build().as_ref(), &profile).unwrap();
            assert_eq!(schedule.horizon(), 4);
        }
    }
}
