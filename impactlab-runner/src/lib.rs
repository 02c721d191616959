//! ImpactLab Runner — Monte Carlo orchestration on top of `impactlab-core`.
//!
//! This crate provides:
//! - The parallel, seed-deterministic Monte Carlo orchestrator
//! - Cost distributions (mean, standard error, percentile bands, CVaR)
//! - Risk-adjusted savings against a baseline strategy
//! - Regime-conditional cost slicing at path and period level
//! - Per-path parameter perturbation
//! - Stress-scenario and order-size experiments
//! - TOML run configuration

pub mod config;
pub mod experiments;
pub mod monte_carlo;
pub mod perturbation;
pub mod regime_slice;
pub mod result;
pub mod stats;

pub use config::{load_config, RunConfig};
pub use experiments::{
    default_stress_scenarios, order_size_sensitivity, stress_test, ScenarioImpact, SizePoint,
    StrategyIncrease, StressTestReport, DEFAULT_ORDER_SIZES,
};
pub use monte_carlo::{risk_adjusted_savings, run_monte_carlo, McError, MonteCarloConfig};
pub use perturbation::{PerturbationConfig, PerturbationDraw};
pub use regime_slice::{
    DominantRegimes, PathRegimeSlice, PeriodRegimeCosts, PeriodRegimeSlice, RegimeBreakdown,
};
pub use result::{
    ComponentCosts, MonteCarloResult, PathOutcome, PathScore, RetainedPath, StrategySummary,
};
pub use stats::CostDistribution;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<MonteCarloConfig>();
        assert_sync::<MonteCarloConfig>();
        assert_send::<PerturbationConfig>();
        assert_sync::<PerturbationConfig>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<MonteCarloResult>();
        assert_sync::<MonteCarloResult>();
        assert_send::<PathOutcome>();
        assert_sync::<PathOutcome>();
        assert_send::<StressTestReport>();
        assert_sync::<StressTestReport>();
    }

    #[test]
    fn error_is_send_sync() {
        assert_send::<McError>();
        assert_sync::<McError>();
    }
}
