//! Process generators: coupled price and variance paths on a shared grid.
//!
//! One `ProcessGenerator::run` produces `horizon + 1` grid points of price and
//! variance from an explicit RNG handle. Every step draws exactly two standard
//! normals, so a path's innovations depend only on its seed: injecting a
//! scenario changes the dynamics but not the random draws.

pub mod heston;
pub mod ou;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::SimulationConfig;
use crate::diagnostics::NumericalDiagnostics;
use crate::scenario::ScenarioOverlay;

pub use heston::{HestonVariance, VarianceStep};
pub use ou::OrnsteinUhlenbeck;

/// Draw `(z_variance, z_price)` with correlation `rho`.
pub fn correlated_normals<R: Rng + ?Sized>(rng: &mut R, rho: f64) -> (f64, f64) {
    let z_v: f64 = rng.sample(StandardNormal);
    let w: f64 = rng.sample(StandardNormal);
    let z_s = rho * z_v + (1.0 - rho * rho).max(0.0).sqrt() * w;
    (z_v, z_s)
}

/// Raw process output for one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPaths {
    /// Prices S_0..S_T.
    pub prices: Vec<f64>,
    /// Effective variance at each grid point (scenario volatility multiplier applied).
    pub variances: Vec<f64>,
    pub diagnostics: NumericalDiagnostics,
}

/// Steps the price and variance processes together.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    price: OrnsteinUhlenbeck,
    variance: HestonVariance,
    initial_price: f64,
    initial_variance: f64,
    correlation: f64,
    horizon: usize,
    dt: f64,
    price_floor: f64,
}

impl ProcessGenerator {
    /// Build from a config that has already passed `validate()`.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            price: OrnsteinUhlenbeck::new(config.mean_reversion, config.long_run_price),
            variance: HestonVariance::from_params(&config.variance),
            initial_price: config.initial_price,
            initial_variance: config.initial_variance(),
            correlation: config.variance.correlation,
            horizon: config.horizon,
            dt: config.dt,
            price_floor: config.price_floor,
        }
    }

    /// Whether the variance parameters meet the Feller condition.
    pub fn satisfies_feller(&self) -> bool {
        self.variance.satisfies_feller()
    }

    /// Generate one realization of both processes under `overlay`.
    pub fn run<R: Rng + ?Sized>(&self, overlay: &ScenarioOverlay, rng: &mut R) -> ProcessPaths {
        let n = self.horizon + 1;
        let mut prices = Vec::with_capacity(n);
        let mut variances = Vec::with_capacity(n);
        let mut diagnostics = NumericalDiagnostics::default();

        let mut v = self.initial_variance;
        let mut s = self.floor(self.initial_price * overlay.shock_factor(0), 0, &mut diagnostics);
        prices.push(s);
        variances.push(effective_variance(v, overlay, 0));

        for t in 0..self.horizon {
            let (z_v, z_s) = correlated_normals(rng, self.correlation);
            let period = overlay.period(t);

            let v_eff = effective_variance(v, overlay, t);
            let raw = self.price.step(s, v_eff, self.dt, z_s, period.drift_rate);

            let step = self.variance.step(v, self.dt, z_v);
            if step.truncated {
                diagnostics.variance_truncations += 1;
                trace!(period = t + 1, "variance truncated to zero");
            }
            v = step.value;

            s = self.floor(raw * overlay.shock_factor(t + 1), t + 1, &mut diagnostics);
            prices.push(s);
            variances.push(effective_variance(v, overlay, t + 1));
        }

        ProcessPaths {
            prices,
            variances,
            diagnostics,
        }
    }

    fn floor(&self, price: f64, period: usize, diagnostics: &mut NumericalDiagnostics) -> f64 {
        // `!(x >= floor)` also catches NaN.
        if !(price >= self.price_floor) {
            diagnostics.price_floor_clamps += 1;
            trace!(period, price, floor = self.price_floor, "price clamped to floor");
            self.price_floor
        } else {
            price
        }
    }
}

fn effective_variance(v: f64, overlay: &ScenarioOverlay, t: usize) -> f64 {
    let m = overlay.period(t).vol_multiplier;
    v * m * m
}
