//! Per-path parameter perturbation.
//!
//! Each path draws its own multipliers for base volatility, spread and depth
//! from the path's perturbation stream, so the draws are reproducible and
//! independent of thread scheduling.

use rand::Rng;
use serde::{Deserialize, Serialize};

use impactlab_core::config::{require_range, ConfigError, SimulationConfig};

/// Half-widths of the uniform multiplier ranges `[1 − x, 1 + x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    pub vol: f64,
    pub spread: f64,
    pub depth: f64,
    /// Keep the reference volatility σ̄ at the unperturbed level. When false,
    /// σ̄ moves with the drawn volatility, so σ_t/σ̄ and hence the quoted
    /// spread are unchanged by the volatility draw.
    pub pin_reference_vol: bool,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            vol: 0.3,
            spread: 0.5,
            depth: 0.4,
            pin_reference_vol: true,
        }
    }
}

impl PerturbationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A half-width of 1 would allow a zero multiplier.
        require_range("perturbation.vol", self.vol, 0.0, 0.99)?;
        require_range("perturbation.spread", self.spread, 0.0, 0.99)?;
        require_range("perturbation.depth", self.depth, 0.0, 0.99)?;
        Ok(())
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> PerturbationDraw {
        let vol_factor = uniform_factor(rng, self.vol);
        PerturbationDraw {
            vol_factor,
            spread_factor: uniform_factor(rng, self.spread),
            depth_factor: uniform_factor(rng, self.depth),
            reference_vol_factor: if self.pin_reference_vol {
                1.0
            } else {
                vol_factor
            },
        }
    }
}

fn uniform_factor<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width > 0.0 {
        1.0 + rng.gen_range(-half_width..=half_width)
    } else {
        1.0
    }
}

/// Multipliers drawn for one path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerturbationDraw {
    pub vol_factor: f64,
    pub spread_factor: f64,
    pub depth_factor: f64,
    /// Multiplier on σ̄: 1.0 when pinned, otherwise equal to `vol_factor`.
    pub reference_vol_factor: f64,
}

impl PerturbationDraw {
    /// Scale `base` by the draw.
    ///
    /// Volatility scales σ, so variance scales by the square. σ̄ is written
    /// out explicitly so it no longer tracks the perturbed variance on its own.
    pub fn apply(&self, base: &SimulationConfig) -> SimulationConfig {
        let mut config = base.clone();
        let var_factor = self.vol_factor * self.vol_factor;
        config.market.reference_vol = Some(base.reference_vol() * self.reference_vol_factor);
        config.variance.long_run = base.variance.long_run * var_factor;
        config.variance.initial = Some(base.initial_variance() * var_factor);
        config.market.base_spread = base.market.base_spread * self.spread_factor;
        config.market.base_depth = base.market.base_depth * self.depth_factor;
        config
    }
}
