//! Mean-reverting (Ornstein–Uhlenbeck) price process with stochastic
//! volatility supplied per step.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnsteinUhlenbeck {
    pub mean_reversion: f64,
    pub long_run: f64,
}

impl OrnsteinUhlenbeck {
    pub fn new(mean_reversion: f64, long_run: f64) -> Self {
        Self {
            mean_reversion,
            long_run,
        }
    }

    /// `S' = S + κ(θ − S)Δt + sqrt(v)·S·√Δt·z + drift_rate·S·Δt`.
    ///
    /// The result is raw; flooring is the caller's job.
    pub fn step(&self, price: f64, variance: f64, dt: f64, z: f64, drift_rate: f64) -> f64 {
        price
            + self.mean_reversion * (self.long_run - price) * dt
            + variance.max(0.0).sqrt() * price * dt.sqrt() * z
            + drift_rate * price * dt
    }
}
