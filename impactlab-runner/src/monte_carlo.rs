//! Monte Carlo orchestrator.
//!
//! Runs N independent market paths, scores every configured strategy on each
//! path, and reduces the per-path costs to distributions.
//!
//! Reproducibility:
//! - path `i` draws its market noise from `(seed, "market", i)` and its
//!   perturbation from `(seed, "perturbation", i)`
//! - paths run on rayon but are collected in index order, so every statistic
//!   is independent of thread count and completion order
//! - schedules are computed once from the forecast volume profile and shared
//!   by every path

use std::borrow::Cow;
use std::collections::HashSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use impactlab_core::config::{require_non_negative, ConfigError, SimulationConfig};
use impactlab_core::cost::{CostError, CostModel, ShortfallMode};
use impactlab_core::diagnostics::NumericalDiagnostics;
use impactlab_core::path::PathGenerator;
use impactlab_core::regime::RegimeConfig;
use impactlab_core::rng::{RngHierarchy, MARKET_STREAM, PERTURBATION_STREAM};
use impactlab_core::scenario::ScenarioSpec;
use impactlab_core::strategy::{Schedule, StrategyError, StrategyKind};

use crate::perturbation::PerturbationConfig;
use crate::regime_slice::{DominantRegimes, PeriodRegimeCosts, RegimeBreakdown};
use crate::result::{
    ComponentCosts, MonteCarloResult, PathOutcome, PathScore, RetainedPath, StrategySummary,
};
use crate::stats::CostDistribution;

/// Standard deviations below this count as a degenerate distribution.
const MIN_STD: f64 = 1e-12;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum McError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("strategy failed: {0}")]
    Strategy(#[from] StrategyError),
    #[error("scoring {strategy} on path {path} failed: {source}")]
    Cost {
        path: u64,
        strategy: String,
        #[source]
        source: CostError,
    },
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

// ─── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of simulated paths N.
    pub paths: usize,
    /// Strategies to score. `None` means Naive, TWAP, VWAP and
    /// Almgren–Chriss at the simulation's urgency.
    pub strategies: Option<Vec<StrategyKind>>,
    /// Name of the strategy risk-adjusted savings are measured against.
    pub baseline: String,
    pub scenario: Option<ScenarioSpec>,
    pub perturbation: Option<PerturbationConfig>,
    pub regime: RegimeConfig,
    pub shortfall_mode: ShortfallMode,
    /// Keep full detail for the first K paths.
    pub retain_paths: usize,
    /// Size of a private rayon pool. `None` uses the global pool.
    pub threads: Option<usize>,
    /// Warn when clamps per simulated period exceed this rate.
    pub clamp_warn_rate: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            paths: 1_000,
            strategies: None,
            baseline: StrategyKind::Twap.name().to_string(),
            scenario: None,
            perturbation: None,
            regime: RegimeConfig::default(),
            shortfall_mode: ShortfallMode::default(),
            retain_paths: 0,
            threads: None,
            clamp_warn_rate: 0.01,
        }
    }
}

impl MonteCarloConfig {
    /// Resolve the strategy list against the simulation's urgency.
    pub fn strategy_kinds(&self, urgency: f64) -> Vec<StrategyKind> {
        match &self.strategies {
            Some(kinds) => kinds.clone(),
            None => StrategyKind::standard(urgency),
        }
    }

    /// The scenario is validated against the horizon when the run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths == 0 {
            return Err(ConfigError::ZeroPaths);
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }

        // Names do not depend on urgency.
        let kinds = self.strategy_kinds(0.0);
        if kinds.is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        let mut seen = HashSet::new();
        for kind in &kinds {
            if !seen.insert(kind.name()) {
                return Err(ConfigError::DuplicateStrategy(kind.name().to_string()));
            }
        }
        if !seen.contains(self.baseline.as_str()) {
            return Err(ConfigError::MissingBaseline(self.baseline.clone()));
        }

        if let Some(perturbation) = &self.perturbation {
            perturbation.validate()?;
        }
        self.regime.validate()?;
        require_non_negative("clamp_warn_rate", self.clamp_warn_rate)?;
        Ok(())
    }
}

// ─── Orchestration ───────────────────────────────────────────────────

/// Run the full Monte Carlo experiment.
///
/// Returns either a complete result or the first error; never a partial
/// aggregate.
pub fn run_monte_carlo(
    sim: &SimulationConfig,
    mc: &MonteCarloConfig,
) -> Result<MonteCarloResult, McError> {
    sim.validate()?;
    mc.validate()?;

    let kinds = mc.strategy_kinds(sim.urgency);
    let generator = PathGenerator::new(sim, mc.scenario.as_ref(), mc.regime.clone())?;
    let model = CostModel::new(sim);
    let hierarchy = RngHierarchy::new(sim.seed);

    // Forecast volumes never see the scenario or the perturbation.
    let profile = generator.forecast_profile();
    let schedules = kinds
        .iter()
        .map(|kind| kind.build().schedule(sim.order_size, sim.horizon, &profile))
        .collect::<Result<Vec<Schedule>, _>>()?;

    info!(
        paths = mc.paths,
        strategies = kinds.len(),
        horizon = sim.horizon,
        scenario = mc.scenario.as_ref().map(|s| s.kind.name()),
        perturbed = mc.perturbation.is_some(),
        seed = sim.seed,
        "starting Monte Carlo run"
    );

    let ctx = PathContext {
        sim,
        mc,
        kinds: &kinds,
        schedules: &schedules,
        generator: &generator,
        model: &model,
        hierarchy: &hierarchy,
    };

    let run = || {
        (0..mc.paths)
            .into_par_iter()
            .map(|i| ctx.simulate(i as u64))
            .collect::<Result<Vec<_>, McError>>()
    };
    let simulated = match mc.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| McError::ThreadPool(e.to_string()))?;
            pool.install(run)?
        }
        None => run()?,
    };

    let mut outcomes = Vec::with_capacity(simulated.len());
    let mut retained = Vec::new();
    for (outcome, kept) in simulated {
        outcomes.push(outcome);
        retained.extend(kept);
    }

    let mut diagnostics = NumericalDiagnostics::default();
    for outcome in &outcomes {
        diagnostics.merge(&outcome.diagnostics);
    }
    let clamp_rate = diagnostics.clamp_rate(mc.paths * sim.horizon);
    if clamp_rate > mc.clamp_warn_rate {
        warn!(
            clamp_rate,
            threshold = mc.clamp_warn_rate,
            variance_truncations = diagnostics.variance_truncations,
            price_floor_clamps = diagnostics.price_floor_clamps,
            participation_clamps = diagnostics.participation_clamps,
            "numerical clamps exceed threshold; parameters may be pathological"
        );
    }

    let strategies = summarize(sim, mc, &kinds, &outcomes);

    for summary in &strategies {
        debug!(
            strategy = %summary.name,
            mean = summary.cost.mean,
            std_dev = summary.cost.std_dev,
            mean_bps = summary.cost_bps.mean,
            risk_adjusted_savings = summary.risk_adjusted_savings,
            "strategy summary"
        );
    }
    info!(
        paths = mc.paths,
        clamps = diagnostics.total(),
        "Monte Carlo run complete"
    );

    Ok(MonteCarloResult {
        paths: mc.paths,
        seed: sim.seed,
        order_size: sim.order_size,
        scenario: mc.scenario.as_ref().map(|s| s.kind),
        shortfall_mode: mc.shortfall_mode,
        baseline: mc.baseline.clone(),
        strategies,
        diagnostics,
        retained,
    })
}

/// Shared, read-only state for simulating one path.
struct PathContext<'a> {
    sim: &'a SimulationConfig,
    mc: &'a MonteCarloConfig,
    kinds: &'a [StrategyKind],
    schedules: &'a [Schedule],
    generator: &'a PathGenerator,
    model: &'a CostModel,
    hierarchy: &'a RngHierarchy,
}

impl PathContext<'_> {
    fn simulate(&self, path_index: u64) -> Result<(PathOutcome, Option<RetainedPath>), McError> {
        let perturbation = self.mc.perturbation.as_ref().map(|p| {
            let mut rng = self.hierarchy.rng_for(PERTURBATION_STREAM, path_index);
            p.draw(&mut rng)
        });

        let (generator, model) = match &perturbation {
            Some(draw) => {
                let config = draw.apply(self.sim);
                let generator =
                    PathGenerator::new(&config, self.mc.scenario.as_ref(), self.mc.regime.clone())?;
                (Cow::Owned(generator), Cow::Owned(CostModel::new(&config)))
            }
            None => (Cow::Borrowed(self.generator), Cow::Borrowed(self.model)),
        };

        let mut rng = self.hierarchy.rng_for(MARKET_STREAM, path_index);
        let path = generator.generate(path_index, &mut rng);

        let mut diagnostics = path.diagnostics;
        let mut scores = Vec::with_capacity(self.schedules.len());
        let mut costs = Vec::with_capacity(self.schedules.len());
        for (kind, schedule) in self.kinds.iter().zip(self.schedules) {
            let breakdown = model.score(&path, schedule).map_err(|source| McError::Cost {
                path: path_index,
                strategy: kind.name().to_string(),
                source,
            })?;
            diagnostics.participation_clamps += breakdown.participation_clamps;
            scores.push(PathScore {
                total: breakdown.total,
                signed_total: breakdown.total_with(ShortfallMode::Signed),
                notional: breakdown.notional,
                components: ComponentCosts::of(&breakdown),
                period_regimes: PeriodRegimeCosts::from_costs(&path, &breakdown),
            });
            costs.push(breakdown);
        }

        let outcome = PathOutcome {
            path_index,
            perturbation,
            dominant_regimes: DominantRegimes::of_path(&path),
            diagnostics,
            scores,
        };
        let kept = (path_index < self.mc.retain_paths as u64).then(|| RetainedPath {
            path,
            schedules: self.schedules.to_vec(),
            costs,
        });
        Ok((outcome, kept))
    }
}

fn summarize(
    sim: &SimulationConfig,
    mc: &MonteCarloConfig,
    kinds: &[StrategyKind],
    outcomes: &[PathOutcome],
) -> Vec<StrategySummary> {
    let mode = mc.shortfall_mode;
    let notional = sim.notional();

    let mut summaries: Vec<StrategySummary> = kinds
        .iter()
        .enumerate()
        .map(|(j, kind)| {
            let totals: Vec<f64> = outcomes.iter().map(|o| o.scores[j].total_with(mode)).collect();
            let bps: Vec<f64> = outcomes.iter().map(|o| o.scores[j].bps_with(mode)).collect();
            let component_means = ComponentCosts::mean(outcomes.iter().map(|o| &o.scores[j].components));
            let regimes = RegimeBreakdown::build(outcomes.iter().map(|o| {
                let score = &o.scores[j];
                (&o.dominant_regimes, score.total_with(mode), &score.period_regimes)
            }));
            StrategySummary {
                strategy: *kind,
                name: kind.name().to_string(),
                cost: CostDistribution::from_values(&totals),
                cost_bps: CostDistribution::from_values(&bps),
                component_means,
                component_means_bps: component_means.bps(notional),
                risk_adjusted_savings: 0.0,
                regimes,
            }
        })
        .collect();

    let baseline_mean = summaries
        .iter()
        .find(|s| s.name == mc.baseline)
        .map(|s| s.cost.mean);
    if let Some(baseline_mean) = baseline_mean {
        for summary in &mut summaries {
            summary.risk_adjusted_savings =
                risk_adjusted_savings(baseline_mean, summary.cost.mean, summary.cost.std_dev);
        }
    }
    summaries
}

/// `(baseline mean − mean) / std`, zero when the distribution is degenerate.
pub fn risk_adjusted_savings(baseline_mean: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev < MIN_STD {
        0.0
    } else {
        (baseline_mean - mean) / std_dev
    }
}
