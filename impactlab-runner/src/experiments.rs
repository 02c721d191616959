//! Stress and sensitivity experiments built on the Monte Carlo runner.

use serde::{Deserialize, Serialize};
use tracing::info;

use impactlab_core::config::SimulationConfig;
use impactlab_core::scenario::{ScenarioKind, ScenarioSpec};

use crate::monte_carlo::{run_monte_carlo, McError, MonteCarloConfig};
use crate::result::MonteCarloResult;

/// Order sizes swept by default: 5%, 10% and 20% of default ADV.
pub const DEFAULT_ORDER_SIZES: [f64; 3] = [50_000.0, 100_000.0, 200_000.0];

/// The three preset scenarios at their default windows.
pub fn default_stress_scenarios(horizon: usize) -> Vec<ScenarioSpec> {
    ScenarioKind::all()
        .into_iter()
        .map(|kind| ScenarioSpec::preset(kind, horizon))
        .collect()
}

// ─── Stress test ─────────────────────────────────────────────────────

/// Mean cost of one strategy with and without a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyIncrease {
    pub strategy: String,
    pub normal_mean: f64,
    pub stressed_mean: f64,
    /// Percent change of the mean; `None` when the normal mean is zero.
    pub increase_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioImpact {
    pub scenario: ScenarioKind,
    pub result: MonteCarloResult,
    pub increases: Vec<StrategyIncrease>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestReport {
    pub normal: MonteCarloResult,
    pub scenarios: Vec<ScenarioImpact>,
}

impl StressTestReport {
    pub fn increase(&self, scenario: ScenarioKind, strategy: &str) -> Option<&StrategyIncrease> {
        self.scenarios
            .iter()
            .find(|s| s.scenario == scenario)?
            .increases
            .iter()
            .find(|i| i.strategy == strategy)
    }
}

/// Run the normal market and each scenario with the same seed.
///
/// Every run draws identical market noise, so the difference between the
/// normal and stressed means is the scenario's effect alone. Any scenario
/// already set on `mc` is ignored.
pub fn stress_test(
    sim: &SimulationConfig,
    mc: &MonteCarloConfig,
    scenarios: &[ScenarioSpec],
) -> Result<StressTestReport, McError> {
    let normal_config = MonteCarloConfig {
        scenario: None,
        ..mc.clone()
    };
    let normal = run_monte_carlo(sim, &normal_config)?;

    let mut impacts = Vec::with_capacity(scenarios.len());
    for spec in scenarios {
        let config = MonteCarloConfig {
            scenario: Some(spec.clone()),
            ..mc.clone()
        };
        let result = run_monte_carlo(sim, &config)?;
        let increases = normal
            .strategies
            .iter()
            .zip(&result.strategies)
            .map(|(base, stressed)| StrategyIncrease {
                strategy: base.name.clone(),
                normal_mean: base.cost.mean,
                stressed_mean: stressed.cost.mean,
                increase_pct: percent_increase(base.cost.mean, stressed.cost.mean),
            })
            .collect();
        info!(scenario = spec.kind.name(), "stress scenario complete");
        impacts.push(ScenarioImpact {
            scenario: spec.kind,
            result,
            increases,
        });
    }

    Ok(StressTestReport {
        normal,
        scenarios: impacts,
    })
}

fn percent_increase(normal: f64, stressed: f64) -> Option<f64> {
    if normal.abs() < 1e-12 {
        None
    } else {
        Some((stressed - normal) / normal * 100.0)
    }
}

// ─── Order-size sensitivity ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePoint {
    pub order_size: f64,
    /// Order size as a fraction of ADV.
    pub adv_fraction: f64,
    pub result: MonteCarloResult,
}

/// Rerun the experiment once per order size, all else fixed.
pub fn order_size_sensitivity(
    sim: &SimulationConfig,
    mc: &MonteCarloConfig,
    sizes: &[f64],
) -> Result<Vec<SizePoint>, McError> {
    sizes
        .iter()
        .map(|&order_size| {
            let config = SimulationConfig {
                order_size,
                ..sim.clone()
            };
            let result = run_monte_carlo(&config, mc)?;
            info!(order_size, "order size run complete");
            Ok(SizePoint {
                order_size,
                adv_fraction: order_size.abs() / sim.market.adv,
                result,
            })
        })
        .collect()
}
