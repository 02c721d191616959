//! Scenario injection: stress overlays applied while a path is generated.
//!
//! A `ScenarioSpec` is compiled into a `ScenarioOverlay`: one `PeriodOverlay`
//! per grid point plus an optional one-off price shock. The process generators
//! read the overlay as they step, so the dynamics continue from the stressed
//! state (a flash crash recovers only through mean reversion, never by
//! snapping back). The overlay is applied before regime classification, so
//! labels reflect the distressed market.

use serde::{Deserialize, Serialize};

use crate::config::{require_positive, require_range, ConfigError, MINUTES_PER_SESSION};

/// Flash-crash volatility multiplier when the scenario gives none.
pub const DEFAULT_CRASH_VOL_MULTIPLIER: f64 = 10.0;
/// Flash-crash spread multiplier when the scenario gives none.
pub const DEFAULT_CRASH_SPREAD_MULTIPLIER: f64 = 5.0;
/// Flash-crash expected-volume multiplier when the scenario gives none.
pub const DEFAULT_CRASH_VOLUME_MULTIPLIER: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Multiplicative price drop at the window start, with a volatility
    /// spike, spread widening and volume collapse for the window.
    FlashCrash,
    /// Expected volume and depth reduced for the window.
    LiquidityDrought,
    /// Deterministic drift added to the price update for the window.
    #[serde(alias = "momentum")]
    MomentumDrift,
}

impl ScenarioKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::FlashCrash => "flash_crash",
            ScenarioKind::LiquidityDrought => "liquidity_drought",
            ScenarioKind::MomentumDrift => "momentum_drift",
        }
    }

    pub fn all() -> [ScenarioKind; 3] {
        [
            ScenarioKind::FlashCrash,
            ScenarioKind::LiquidityDrought,
            ScenarioKind::MomentumDrift,
        ]
    }
}

/// A stress scenario over the window `[start, start + duration)`.
///
/// `magnitude` means:
/// - flash crash: fractional price drop, in (0, 1)
/// - liquidity drought: fraction of volume and depth removed, in [0, 1]
/// - momentum drift: drift rate per unit time, added as `magnitude·S_t·Δt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub kind: ScenarioKind,
    pub start: usize,
    pub duration: usize,
    pub magnitude: f64,
    #[serde(default)]
    pub vol_multiplier: Option<f64>,
    #[serde(default)]
    pub spread_multiplier: Option<f64>,
    #[serde(default)]
    pub volume_multiplier: Option<f64>,
}

impl ScenarioSpec {
    pub fn new(kind: ScenarioKind, start: usize, duration: usize, magnitude: f64) -> Self {
        Self {
            kind,
            start,
            duration,
            magnitude,
            vol_multiplier: None,
            spread_multiplier: None,
            volume_multiplier: None,
        }
    }

    /// 25% crash at period 5 lasting 10 periods.
    pub fn flash_crash() -> Self {
        Self::new(ScenarioKind::FlashCrash, 5, 10, 0.25)
    }

    /// 90% of liquidity gone for the first 30 periods.
    pub fn liquidity_drought() -> Self {
        Self::new(ScenarioKind::LiquidityDrought, 0, 30, 0.9)
    }

    /// Upward drift of 0.05% per minute over the whole horizon.
    pub fn momentum_drift(horizon: usize) -> Self {
        Self::new(ScenarioKind::MomentumDrift, 0, horizon, 0.0005 * MINUTES_PER_SESSION)
    }

    /// Named preset for `kind`.
    pub fn preset(kind: ScenarioKind, horizon: usize) -> Self {
        match kind {
            ScenarioKind::FlashCrash => Self::flash_crash(),
            ScenarioKind::LiquidityDrought => Self::liquidity_drought(),
            ScenarioKind::MomentumDrift => Self::momentum_drift(horizon),
        }
    }

    pub fn vol_multiplier(&self) -> f64 {
        self.vol_multiplier.unwrap_or(DEFAULT_CRASH_VOL_MULTIPLIER)
    }

    pub fn spread_multiplier(&self) -> f64 {
        self.spread_multiplier
            .unwrap_or(DEFAULT_CRASH_SPREAD_MULTIPLIER)
    }

    pub fn volume_multiplier(&self) -> f64 {
        self.volume_multiplier
            .unwrap_or(DEFAULT_CRASH_VOLUME_MULTIPLIER)
    }

    pub fn validate(&self, horizon: usize) -> Result<(), ConfigError> {
        if self.duration == 0 {
            return Err(ConfigError::EmptyWindow {
                name: "scenario.duration",
            });
        }
        if self.start >= horizon {
            return Err(ConfigError::ScenarioOutsideHorizon {
                start: self.start,
                horizon,
            });
        }
        match self.kind {
            ScenarioKind::FlashCrash => {
                if !(self.magnitude > 0.0 && self.magnitude < 1.0) {
                    return Err(ConfigError::OutsideUnitInterval {
                        name: "scenario.magnitude",
                        value: self.magnitude,
                    });
                }
                require_positive("scenario.vol_multiplier", self.vol_multiplier())?;
                require_positive("scenario.spread_multiplier", self.spread_multiplier())?;
                require_positive("scenario.volume_multiplier", self.volume_multiplier())?;
            }
            ScenarioKind::LiquidityDrought => {
                require_range("scenario.magnitude", self.magnitude, 0.0, 1.0)?;
            }
            ScenarioKind::MomentumDrift => {
                if !self.magnitude.is_finite() {
                    return Err(ConfigError::ZeroOrNotFinite {
                        name: "scenario.magnitude",
                        value: self.magnitude,
                    });
                }
            }
        }
        Ok(())
    }

    /// Window end (exclusive), clipped to the `horizon + 1` grid points.
    pub fn end(&self, horizon: usize) -> usize {
        self.start.saturating_add(self.duration).min(horizon + 1)
    }

    pub fn contains(&self, period: usize, horizon: usize) -> bool {
        period >= self.start && period < self.end(horizon)
    }
}

// ─── Overlay ─────────────────────────────────────────────────────────

/// Multipliers and drift in effect at one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodOverlay {
    /// Multiplies volatility (variance is multiplied by its square).
    pub vol_multiplier: f64,
    pub spread_multiplier: f64,
    pub volume_multiplier: f64,
    pub depth_multiplier: f64,
    /// Drift rate per unit time, applied as `drift_rate·S_t·Δt`.
    pub drift_rate: f64,
}

impl PeriodOverlay {
    pub const NEUTRAL: PeriodOverlay = PeriodOverlay {
        vol_multiplier: 1.0,
        spread_multiplier: 1.0,
        volume_multiplier: 1.0,
        depth_multiplier: 1.0,
        drift_rate: 0.0,
    };
}

impl Default for PeriodOverlay {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// A one-off multiplicative price shock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceShock {
    pub period: usize,
    pub factor: f64,
}

/// Per-period stress overlay for a whole path (`horizon + 1` grid points).
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOverlay {
    periods: Vec<PeriodOverlay>,
    shock: Option<PriceShock>,
    kind: Option<ScenarioKind>,
}

impl ScenarioOverlay {
    /// No stress at any period.
    pub fn neutral(horizon: usize) -> Self {
        Self {
            periods: vec![PeriodOverlay::NEUTRAL; horizon + 1],
            shock: None,
            kind: None,
        }
    }

    /// Compile a validated spec into an overlay.
    pub fn from_spec(spec: &ScenarioSpec, horizon: usize) -> Result<Self, ConfigError> {
        spec.validate(horizon)?;
        let mut overlay = Self::neutral(horizon);
        overlay.kind = Some(spec.kind);

        let window = spec.start..spec.end(horizon);
        match spec.kind {
            ScenarioKind::FlashCrash => {
                overlay.shock = Some(PriceShock {
                    period: spec.start,
                    factor: 1.0 - spec.magnitude,
                });
                for p in &mut overlay.periods[window] {
                    p.vol_multiplier = spec.vol_multiplier();
                    p.spread_multiplier = spec.spread_multiplier();
                    p.volume_multiplier = spec.volume_multiplier();
                }
            }
            ScenarioKind::LiquidityDrought => {
                let remaining = 1.0 - spec.magnitude;
                for p in &mut overlay.periods[window] {
                    p.volume_multiplier = remaining;
                    p.depth_multiplier = remaining;
                }
            }
            ScenarioKind::MomentumDrift => {
                for p in &mut overlay.periods[window] {
                    p.drift_rate = spec.magnitude;
                }
            }
        }
        Ok(overlay)
    }

    /// Overlay from an optional spec.
    pub fn build(spec: Option<&ScenarioSpec>, horizon: usize) -> Result<Self, ConfigError> {
        match spec {
            Some(spec) => Self::from_spec(spec, horizon),
            None => Ok(Self::neutral(horizon)),
        }
    }

    pub fn period(&self, t: usize) -> PeriodOverlay {
        self.periods.get(t).copied().unwrap_or(PeriodOverlay::NEUTRAL)
    }

    /// Price multiplier applied at period `t` (1.0 when no shock lands there).
    pub fn shock_factor(&self, t: usize) -> f64 {
        match self.shock {
            Some(shock) if shock.period == t => shock.factor,
            _ => 1.0,
        }
    }

    pub fn kind(&self) -> Option<ScenarioKind> {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_overlay_is_identity() {
        let overlay = ScenarioOverlay::neutral(10);
        assert_eq!(overlay.len(), 11);
        for t in 0..=10 {
            assert_eq!(overlay.period(t), PeriodOverlay::NEUTRAL);
            assert_eq!(overlay.shock_factor(t), 1.0);
        }
        assert!(overlay.kind().is_none());
    }

    #[test]
    fn flash_crash_window_and_shock() {
        let spec = ScenarioSpec::new(ScenarioKind::FlashCrash, 5, 10, 0.2);
        let overlay = ScenarioOverlay::from_spec(&spec, 120).unwrap();

        assert_eq!(overlay.shock_factor(5), 0.8);
        assert_eq!(overlay.shock_factor(6), 1.0);
        assert_eq!(overlay.period(4), PeriodOverlay::NEUTRAL);
        assert_eq!(overlay.period(5).vol_multiplier, 10.0);
        assert_eq!(overlay.period(14).spread_multiplier, 5.0);
        assert_eq!(overlay.period(14).volume_multiplier, 0.3);
        assert_eq!(overlay.period(15), PeriodOverlay::NEUTRAL);
    }

    #[test]
    fn flash_crash_overrides_are_used() {
        let mut spec = ScenarioSpec::flash_crash();
        spec.vol_multiplier = Some(3.0);
        spec.spread_multiplier = Some(2.0);
        spec.volume_multiplier = Some(0.5);
        let overlay = ScenarioOverlay::from_spec(&spec, 120).unwrap();
        let p = overlay.period(spec.start);
        assert_eq!(p.vol_multiplier, 3.0);
        assert_eq!(p.spread_multiplier, 2.0);
        assert_eq!(p.volume_multiplier, 0.5);
    }

    #[test]
    fn drought_reduces_volume_and_depth_only() {
        let spec = ScenarioSpec::new(ScenarioKind::LiquidityDrought, 0, 30, 0.75);
        let overlay = ScenarioOverlay::from_spec(&spec, 120).unwrap();
        let p = overlay.period(10);
        assert_eq!(p.volume_multiplier, 0.25);
        assert_eq!(p.depth_multiplier, 0.25);
        assert_eq!(p.spread_multiplier, 1.0);
        assert_eq!(p.vol_multiplier, 1.0);
        assert!((0..=120).all(|t| overlay.shock_factor(t) == 1.0));
        assert_eq!(overlay.period(30), PeriodOverlay::NEUTRAL);
    }

    #[test]
    fn momentum_window_is_clipped_to_horizon() {
        let spec = ScenarioSpec::new(ScenarioKind::MomentumDrift, 100, 10_000, 0.05);
        assert_eq!(spec.end(120), 121);
        let overlay = ScenarioOverlay::from_spec(&spec, 120).unwrap();
        assert_eq!(overlay.period(120).drift_rate, 0.05);
        assert_eq!(overlay.period(99).drift_rate, 0.0);
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let zero = ScenarioSpec::new(ScenarioKind::FlashCrash, 5, 0, 0.1);
        assert!(matches!(
            zero.validate(120),
            Err(ConfigError::EmptyWindow { .. })
        ));

        let late = ScenarioSpec::new(ScenarioKind::FlashCrash, 120, 5, 0.1);
        assert!(matches!(
            late.validate(120),
            Err(ConfigError::ScenarioOutsideHorizon { .. })
        ));

        let total_crash = ScenarioSpec::new(ScenarioKind::FlashCrash, 5, 5, 1.0);
        assert!(total_crash.validate(120).is_err());

        let over_drought = ScenarioSpec::new(ScenarioKind::LiquidityDrought, 0, 5, 1.5);
        assert!(over_drought.validate(120).is_err());

        let mut bad_mult = ScenarioSpec::flash_crash();
        bad_mult.spread_multiplier = Some(0.0);
        assert!(bad_mult.validate(120).is_err());
    }

    #[test]
    fn presets_validate() {
        for kind in ScenarioKind::all() {
            assert!(ScenarioSpec::preset(kind, 120).validate(120).is_ok());
        }
    }

    #[test]
    fn kind_parses_from_snake_case_and_alias() {
        let spec: ScenarioSpec = serde_json::from_str(
            r#"{"kind":"momentum","start":0,"duration":10,"magnitude":0.1}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, ScenarioKind::MomentumDrift);

        let spec: ScenarioSpec = serde_json::from_str(
            r#"{"kind":"liquidity_drought","start":0,"duration":10,"magnitude":0.5}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, ScenarioKind::LiquidityDrought);
        assert_eq!(spec.kind.name(), "liquidity_drought");
    }
}
