//! Monte Carlo result types.

use serde::{Deserialize, Serialize};

use impactlab_core::cost::{CostBreakdown, CostComponent, ShortfallMode};
use impactlab_core::diagnostics::NumericalDiagnostics;
use impactlab_core::path::MarketPath;
use impactlab_core::scenario::ScenarioKind;
use impactlab_core::strategy::{Schedule, StrategyKind};

use crate::perturbation::PerturbationDraw;
use crate::regime_slice::{DominantRegimes, PeriodRegimeCosts, RegimeBreakdown};
use crate::stats::CostDistribution;

/// The five cost components side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentCosts {
    pub spread: f64,
    pub temporary: f64,
    pub permanent: f64,
    pub implementation_shortfall: f64,
    pub adverse_selection: f64,
}

impl ComponentCosts {
    pub fn of(costs: &CostBreakdown) -> Self {
        Self {
            spread: costs.spread,
            temporary: costs.temporary,
            permanent: costs.permanent,
            implementation_shortfall: costs.implementation_shortfall,
            adverse_selection: costs.adverse_selection,
        }
    }

    pub fn get(&self, component: CostComponent) -> f64 {
        match component {
            CostComponent::Spread => self.spread,
            CostComponent::Temporary => self.temporary,
            CostComponent::Permanent => self.permanent,
            CostComponent::ImplementationShortfall => self.implementation_shortfall,
            CostComponent::AdverseSelection => self.adverse_selection,
        }
    }

    pub fn total(&self) -> f64 {
        self.spread
            + self.temporary
            + self.permanent
            + self.implementation_shortfall
            + self.adverse_selection
    }

    /// Field-wise mean over `items`.
    pub fn mean<'a>(items: impl IntoIterator<Item = &'a ComponentCosts>) -> Self {
        let mut sum = Self::default();
        let mut n = 0usize;
        for c in items {
            sum.spread += c.spread;
            sum.temporary += c.temporary;
            sum.permanent += c.permanent;
            sum.implementation_shortfall += c.implementation_shortfall;
            sum.adverse_selection += c.adverse_selection;
            n += 1;
        }
        if n == 0 {
            return sum;
        }
        let k = n as f64;
        Self {
            spread: sum.spread / k,
            temporary: sum.temporary / k,
            permanent: sum.permanent / k,
            implementation_shortfall: sum.implementation_shortfall / k,
            adverse_selection: sum.adverse_selection / k,
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            spread: self.spread * factor,
            temporary: self.temporary * factor,
            permanent: self.permanent * factor,
            implementation_shortfall: self.implementation_shortfall * factor,
            adverse_selection: self.adverse_selection * factor,
        }
    }

    /// Components in basis points of `notional`.
    pub fn bps(&self, notional: f64) -> Self {
        if notional > 0.0 {
            self.scaled(10_000.0 / notional)
        } else {
            Self::default()
        }
    }
}

/// One strategy's cost on one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathScore {
    pub total: f64,
    pub signed_total: f64,
    pub notional: f64,
    pub components: ComponentCosts,
    pub period_regimes: PeriodRegimeCosts,
}

impl PathScore {
    pub fn total_with(&self, mode: ShortfallMode) -> f64 {
        match mode {
            ShortfallMode::Clipped => self.total,
            ShortfallMode::Signed => self.signed_total,
        }
    }

    pub fn bps_with(&self, mode: ShortfallMode) -> f64 {
        if self.notional > 0.0 {
            self.total_with(mode) / self.notional * 10_000.0
        } else {
            0.0
        }
    }
}

/// Everything kept from one simulated path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathOutcome {
    pub path_index: u64,
    pub perturbation: Option<PerturbationDraw>,
    pub dominant_regimes: DominantRegimes,
    pub diagnostics: NumericalDiagnostics,
    /// Scores in the order of the configured strategies.
    pub scores: Vec<PathScore>,
}

/// Full detail of a retained path, for plotting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedPath {
    pub path: MarketPath,
    pub schedules: Vec<Schedule>,
    pub costs: Vec<CostBreakdown>,
}

/// Aggregate statistics for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: StrategyKind,
    pub name: String,
    /// Total cost in currency, under the run's shortfall mode.
    pub cost: CostDistribution,
    /// The same totals in basis points of arrival notional.
    pub cost_bps: CostDistribution,
    pub component_means: ComponentCosts,
    pub component_means_bps: ComponentCosts,
    /// `(baseline mean − mean) / std`, zero for a degenerate distribution.
    pub risk_adjusted_savings: f64,
    pub regimes: RegimeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub paths: usize,
    pub seed: u64,
    pub order_size: f64,
    pub scenario: Option<ScenarioKind>,
    pub shortfall_mode: ShortfallMode,
    pub baseline: String,
    pub strategies: Vec<StrategySummary>,
    pub diagnostics: NumericalDiagnostics,
    pub retained: Vec<RetainedPath>,
}

impl MonteCarloResult {
    pub fn strategy(&self, name: &str) -> Option<&StrategySummary> {
        self.strategies.iter().find(|s| s.name == name)
    }

    pub fn baseline_summary(&self) -> Option<&StrategySummary> {
        self.strategy(&self.baseline)
    }
}
