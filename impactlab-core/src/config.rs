//! Simulation configuration: the immutable parameter bundle shared by the
//! process generators, the microstructure model, the strategies and the cost
//! engine.
//!
//! Every field has a serde default, so a TOML file only needs to name the
//! parameters it overrides. `validate()` must pass before any simulation
//! starts; invalid values are rejected, never silently corrected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::TemporaryDecay;

/// Hard cap on the number of periods in one path.
pub const MAX_PERIODS: usize = 100_000;

/// Trading minutes in a regular US equity session.
pub const MINUTES_PER_SESSION: f64 = 390.0;

// ─── Errors ──────────────────────────────────────────────────────────

/// Invalid configuration. Always names the offending parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be strictly positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be non-negative (got {value})")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must lie in the open interval (0, 1) (got {value})")]
    OutsideUnitInterval { name: &'static str, value: f64 },
    #[error("{name} must lie in [{lo}, {hi}] (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
    #[error("{name} must be finite and non-zero (got {value})")]
    ZeroOrNotFinite { name: &'static str, value: f64 },
    #[error("horizon must be between 1 and {max} periods (got {value})")]
    Horizon { value: usize, max: usize },
    #[error("paths must be at least 1")]
    ZeroPaths,
    #[error("at least one strategy is required")]
    NoStrategies,
    #[error("baseline strategy {0} is not among the configured strategies")]
    MissingBaseline(String),
    #[error("strategy {0} is configured more than once")]
    DuplicateStrategy(String),
    #[error("threads must be at least 1 when set")]
    ZeroThreads,
    #[error("scenario {name} must be at least 1 period")]
    EmptyWindow { name: &'static str },
    #[error("scenario starts at period {start}, beyond the {horizon}-period horizon")]
    ScenarioOutsideHorizon { start: usize, horizon: usize },
    #[error("regime percentiles must satisfy 0 < low < high < 100 (got {low}, {high})")]
    RegimePercentiles { low: f64, high: f64 },
    #[error("regime window must be at least 2 periods (got {0})")]
    RegimeWindow(usize),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },
}

pub fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    // `!(x > 0)` also rejects NaN.
    if !(value > 0.0) || !value.is_finite() {
        return Err(ConfigError::NonPositive { name, value });
    }
    Ok(())
}

pub fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(())
}

fn require_unit_open(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(ConfigError::OutsideUnitInterval { name, value });
    }
    Ok(())
}

pub fn require_range(
    name: &'static str,
    value: f64,
    lo: f64,
    hi: f64,
) -> Result<(), ConfigError> {
    if !(value >= lo && value <= hi) {
        return Err(ConfigError::OutOfRange { name, value, lo, hi });
    }
    Ok(())
}

// ─── Parameter groups ────────────────────────────────────────────────

/// Heston/CIR variance process parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarianceParams {
    /// Mean-reversion speed κ_v.
    pub mean_reversion: f64,
    /// Long-run variance θ_v.
    pub long_run: f64,
    /// Volatility of variance σ_v.
    pub vol_of_vol: f64,
    /// Starting variance v₀. Defaults to θ_v.
    pub initial: Option<f64>,
    /// Correlation ρ between variance and price innovations (leverage effect).
    pub correlation: f64,
}

impl Default for VarianceParams {
    fn default() -> Self {
        Self {
            mean_reversion: 3.0,
            // 2% daily volatility
            long_run: 0.0004,
            vol_of_vol: 0.03,
            initial: None,
            correlation: 0.0,
        }
    }
}

/// Liquidity parameters for the microstructure model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketParams {
    /// Average daily volume (shares).
    pub adv: f64,
    /// Spread at reference volatility with no pending order.
    pub base_spread: f64,
    /// Displayed depth with no pending order.
    pub base_depth: f64,
    /// Reference volatility σ̄. Defaults to sqrt(θ_v).
    pub reference_vol: Option<f64>,
    /// Ceiling on the participation ratio |q_t| / V_t.
    pub max_participation: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            adv: 1_000_000.0,
            base_spread: 0.02,
            base_depth: 10_000.0,
            reference_vol: None,
            max_participation: 10.0,
        }
    }
}

/// Market impact parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParams {
    /// Temporary impact scale γ.
    pub gamma: f64,
    /// Temporary impact concavity α ∈ (0, 1).
    pub alpha: f64,
    /// Temporary impact half-life in periods.
    pub half_life: f64,
    /// Permanent impact scale η.
    pub eta: f64,
    /// Permanent impact concavity β ∈ (0, 1).
    pub beta: f64,
    /// How the temporary impact decay weight is computed.
    pub decay: TemporaryDecay,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            gamma: 0.1,
            alpha: 0.65,
            half_life: 10.0,
            eta: 0.03,
            beta: 0.42,
            decay: TemporaryDecay::Terminal,
        }
    }
}

impl ImpactParams {
    /// λ = ln 2 / half_life.
    pub fn decay_rate(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life
    }
}

// ─── SimulationConfig ────────────────────────────────────────────────

/// Complete parameter bundle for one simulated execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Arrival price S₀.
    pub initial_price: f64,
    /// Price mean-reversion speed κ.
    pub mean_reversion: f64,
    /// Long-run price θ.
    pub long_run_price: f64,
    pub variance: VarianceParams,
    /// Number of trading periods T.
    pub horizon: usize,
    /// Period length Δt in model time units (one unit = one session).
    pub dt: f64,
    pub market: MarketParams,
    pub impact: ImpactParams,
    /// Almgren–Chriss urgency κT.
    pub urgency: f64,
    /// Signed order size Q (positive buys, negative sells).
    pub order_size: f64,
    /// Prices are clamped to this floor.
    pub price_floor: f64,
    /// Master seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_price: 100.0,
            mean_reversion: 0.5,
            long_run_price: 100.0,
            variance: VarianceParams::default(),
            horizon: 120,
            dt: 1.0 / MINUTES_PER_SESSION,
            market: MarketParams::default(),
            impact: ImpactParams::default(),
            urgency: 3.0,
            order_size: 100_000.0,
            price_floor: 0.01,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Parse a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every invariant. Fails on the first offending parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("initial_price", self.initial_price)?;
        require_positive("mean_reversion", self.mean_reversion)?;
        require_positive("long_run_price", self.long_run_price)?;

        require_positive("variance.mean_reversion", self.variance.mean_reversion)?;
        require_positive("variance.long_run", self.variance.long_run)?;
        require_non_negative("variance.vol_of_vol", self.variance.vol_of_vol)?;
        if let Some(v0) = self.variance.initial {
            require_non_negative("variance.initial", v0)?;
        }
        require_range("variance.correlation", self.variance.correlation, -1.0, 1.0)?;

        if self.horizon == 0 || self.horizon > MAX_PERIODS {
            return Err(ConfigError::Horizon {
                value: self.horizon,
                max: MAX_PERIODS,
            });
        }
        require_positive("dt", self.dt)?;

        require_positive("market.adv", self.market.adv)?;
        require_positive("market.base_spread", self.market.base_spread)?;
        require_positive("market.base_depth", self.market.base_depth)?;
        if let Some(sigma_bar) = self.market.reference_vol {
            require_positive("market.reference_vol", sigma_bar)?;
        }
        require_positive("market.max_participation", self.market.max_participation)?;

        require_positive("impact.gamma", self.impact.gamma)?;
        require_unit_open("impact.alpha", self.impact.alpha)?;
        require_positive("impact.half_life", self.impact.half_life)?;
        require_positive("impact.eta", self.impact.eta)?;
        require_unit_open("impact.beta", self.impact.beta)?;

        require_non_negative("urgency", self.urgency)?;
        if self.order_size == 0.0 || !self.order_size.is_finite() {
            return Err(ConfigError::ZeroOrNotFinite {
                name: "order_size",
                value: self.order_size,
            });
        }
        require_positive("price_floor", self.price_floor)?;
        Ok(())
    }

    /// σ̄: configured reference volatility, or sqrt(θ_v).
    pub fn reference_vol(&self) -> f64 {
        self.market
            .reference_vol
            .unwrap_or_else(|| self.variance.long_run.sqrt())
    }

    /// v₀: configured initial variance, or θ_v.
    pub fn initial_variance(&self) -> f64 {
        self.variance.initial.unwrap_or(self.variance.long_run)
    }

    /// Arrival notional S₀·|Q|.
    pub fn notional(&self) -> f64 {
        self.initial_price * self.order_size.abs()
    }
}
