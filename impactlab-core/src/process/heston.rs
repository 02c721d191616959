//! Heston/CIR square-root variance process with full-truncation Euler steps.
//!
//! Full truncation evaluates drift and diffusion at `max(v, 0)` and clamps the
//! updated value to zero. It never rejects a path; the price is a small bias
//! relative to exact CIR sampling, which is acceptable at simulation grade.

use crate::config::VarianceParams;

/// Outcome of one variance step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceStep {
    pub value: f64,
    /// True when the raw update went negative and was clamped to zero.
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonVariance {
    pub mean_reversion: f64,
    pub long_run: f64,
    pub vol_of_vol: f64,
}

impl HestonVariance {
    pub fn new(mean_reversion: f64, long_run: f64, vol_of_vol: f64) -> Self {
        Self {
            mean_reversion,
            long_run,
            vol_of_vol,
        }
    }

    pub fn from_params(params: &VarianceParams) -> Self {
        Self::new(params.mean_reversion, params.long_run, params.vol_of_vol)
    }

    /// `v' = v + κ_v(θ_v − v⁺)Δt + σ_v·sqrt(v⁺)·√Δt·z`, then `max(v', 0)`.
    pub fn step(&self, v: f64, dt: f64, z: f64) -> VarianceStep {
        let v_plus = v.max(0.0);
        let next = v
            + self.mean_reversion * (self.long_run - v_plus) * dt
            + self.vol_of_vol * v_plus.sqrt() * dt.sqrt() * z;

        if next < 0.0 || next.is_nan() {
            VarianceStep {
                value: 0.0,
                truncated: true,
            }
        } else {
            VarianceStep {
                value: next,
                truncated: false,
            }
        }
    }

    /// Feller condition 2κ_vθ_v ≥ σ_v². When it fails, the discretized process
    /// hits zero often and truncation counts climb.
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.mean_reversion * self.long_run >= self.vol_of_vol * self.vol_of_vol
    }
}
