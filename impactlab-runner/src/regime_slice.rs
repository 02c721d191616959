//! Regime-conditional cost slicing.
//!
//! Two views:
//! - path level: each path is assigned its dominant regime per axis (the most
//!   frequent classified label) and whole-path costs are averaged per bucket
//! - period level: the spread and temporary cost paid in each period is
//!   attributed to that period's own label
//!
//! Periods with `InsufficientHistory` are excluded from both.

use serde::{Deserialize, Serialize};

use impactlab_core::cost::CostBreakdown;
use impactlab_core::path::MarketPath;
use impactlab_core::regime::{RegimeAxis, RegimeLevel};

fn axis_index(axis: RegimeAxis) -> usize {
    match axis {
        RegimeAxis::Volatility => 0,
        RegimeAxis::Spread => 1,
        RegimeAxis::Volume => 2,
    }
}

fn level_index(level: RegimeLevel) -> usize {
    match level {
        RegimeLevel::Low => 0,
        RegimeLevel::Medium => 1,
        RegimeLevel::High => 2,
    }
}

/// Most frequent classified level on each axis of one path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantRegimes {
    pub volatility: Option<RegimeLevel>,
    pub spread: Option<RegimeLevel>,
    pub volume: Option<RegimeLevel>,
}

impl DominantRegimes {
    /// Ties go to the more stressed level (High over Medium over Low).
    pub fn of_path(path: &MarketPath) -> Self {
        let mut counts = [[0usize; 3]; 3];
        for state in &path.states {
            for axis in RegimeAxis::all() {
                if let Some(level) = state.regime.level(axis) {
                    counts[axis_index(axis)][level_index(level)] += 1;
                }
            }
        }
        let dominant = |axis: RegimeAxis| {
            let row = counts[axis_index(axis)];
            RegimeLevel::all()
                .into_iter()
                .filter(|l| row[level_index(*l)] > 0)
                .max_by_key(|l| (row[level_index(*l)], level_index(*l)))
        };
        Self {
            volatility: dominant(RegimeAxis::Volatility),
            spread: dominant(RegimeAxis::Spread),
            volume: dominant(RegimeAxis::Volume),
        }
    }

    pub fn level(&self, axis: RegimeAxis) -> Option<RegimeLevel> {
        match axis {
            RegimeAxis::Volatility => self.volatility,
            RegimeAxis::Spread => self.spread,
            RegimeAxis::Volume => self.volume,
        }
    }
}

/// Spread + temporary cost and period counts per (axis, level) for one path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodRegimeCosts {
    cost: [[f64; 3]; 3],
    periods: [[usize; 3]; 3],
}

impl PeriodRegimeCosts {
    pub fn from_costs(path: &MarketPath, costs: &CostBreakdown) -> Self {
        let mut out = Self::default();
        for period in &costs.periods {
            let Some(state) = path.state(period.period) else {
                continue;
            };
            for axis in RegimeAxis::all() {
                if let Some(level) = state.regime.level(axis) {
                    let (a, l) = (axis_index(axis), level_index(level));
                    out.cost[a][l] += period.spread + period.temporary;
                    out.periods[a][l] += 1;
                }
            }
        }
        out
    }

    pub fn merge(&mut self, other: &PeriodRegimeCosts) {
        for a in 0..3 {
            for l in 0..3 {
                self.cost[a][l] += other.cost[a][l];
                self.periods[a][l] += other.periods[a][l];
            }
        }
    }

    pub fn cost(&self, axis: RegimeAxis, level: RegimeLevel) -> f64 {
        self.cost[axis_index(axis)][level_index(level)]
    }

    pub fn periods(&self, axis: RegimeAxis, level: RegimeLevel) -> usize {
        self.periods[axis_index(axis)][level_index(level)]
    }
}

/// Mean whole-path cost of paths whose dominant regime is `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRegimeSlice {
    pub axis: RegimeAxis,
    pub level: RegimeLevel,
    pub paths: usize,
    pub mean_cost: f64,
}

/// Spread + temporary cost paid in periods labelled `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRegimeSlice {
    pub axis: RegimeAxis,
    pub level: RegimeLevel,
    pub periods: usize,
    pub total_cost: f64,
    pub mean_cost_per_period: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeBreakdown {
    pub path_level: Vec<PathRegimeSlice>,
    pub period_level: Vec<PeriodRegimeSlice>,
}

impl RegimeBreakdown {
    /// Build both views from per-path `(dominant regimes, total cost, period costs)`.
    pub fn build<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = (&'a DominantRegimes, f64, &'a PeriodRegimeCosts)>,
    {
        let mut sums = [[0.0f64; 3]; 3];
        let mut counts = [[0usize; 3]; 3];
        let mut periods = PeriodRegimeCosts::default();

        for (dominant, total, period_costs) in paths {
            for axis in RegimeAxis::all() {
                if let Some(level) = dominant.level(axis) {
                    sums[axis_index(axis)][level_index(level)] += total;
                    counts[axis_index(axis)][level_index(level)] += 1;
                }
            }
            periods.merge(period_costs);
        }

        let mut path_level = Vec::new();
        let mut period_level = Vec::new();
        for axis in RegimeAxis::all() {
            for level in RegimeLevel::all() {
                let (a, l) = (axis_index(axis), level_index(level));
                if counts[a][l] > 0 {
                    path_level.push(PathRegimeSlice {
                        axis,
                        level,
                        paths: counts[a][l],
                        mean_cost: sums[a][l] / counts[a][l] as f64,
                    });
                }
                let n = periods.periods(axis, level);
                if n > 0 {
                    let total_cost = periods.cost(axis, level);
                    period_level.push(PeriodRegimeSlice {
                        axis,
                        level,
                        periods: n,
                        total_cost,
                        mean_cost_per_period: total_cost / n as f64,
                    });
                }
            }
        }

        Self {
            path_level,
            period_level,
        }
    }

    pub fn path_slice(&self, axis: RegimeAxis, level: RegimeLevel) -> Option<&PathRegimeSlice> {
        self.path_level
            .iter()
            .find(|s| s.axis == axis && s.level == level)
    }

    pub fn period_slice(
        &self,
        axis: RegimeAxis,
        level: RegimeLevel,
    ) -> Option<&PeriodRegimeSlice> {
        self.period_level
            .iter()
            .find(|s| s.axis == axis && s.level == level)
    }
}
