//! Regime classification from trailing-window percentiles.
//!
//! Each axis (volatility, spread, volume) keeps a fixed-capacity rolling
//! window of its last `window` observations. A period is classified against
//! the window as it stood *before* the period's own value was added: above the
//! high percentile is `High`, below the low percentile is `Low`, anything
//! between (ties included) is `Medium`. Until the window is full, the period
//! carries `InsufficientHistory`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::stats::percentile_sorted;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLevel {
    Low,
    Medium,
    High,
}

impl RegimeLevel {
    pub fn name(&self) -> &'static str {
        match self {
            RegimeLevel::Low => "low",
            RegimeLevel::Medium => "medium",
            RegimeLevel::High => "high",
        }
    }

    pub fn all() -> [RegimeLevel; 3] {
        [RegimeLevel::Low, RegimeLevel::Medium, RegimeLevel::High]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeAxis {
    Volatility,
    Spread,
    Volume,
}

impl RegimeAxis {
    pub fn name(&self) -> &'static str {
        match self {
            RegimeAxis::Volatility => "volatility",
            RegimeAxis::Spread => "spread",
            RegimeAxis::Volume => "volume",
        }
    }

    pub fn all() -> [RegimeAxis; 3] {
        [RegimeAxis::Volatility, RegimeAxis::Spread, RegimeAxis::Volume]
    }
}

/// Regime of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLabel {
    InsufficientHistory,
    Classified {
        volatility: RegimeLevel,
        spread: RegimeLevel,
        volume: RegimeLevel,
    },
}

impl RegimeLabel {
    pub fn level(&self, axis: RegimeAxis) -> Option<RegimeLevel> {
        match self {
            RegimeLabel::InsufficientHistory => None,
            RegimeLabel::Classified {
                volatility,
                spread,
                volume,
            } => Some(match axis {
                RegimeAxis::Volatility => *volatility,
                RegimeAxis::Spread => *spread,
                RegimeAxis::Volume => *volume,
            }),
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self, RegimeLabel::Classified { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Trailing window length in periods.
    pub window: usize,
    /// Percentile below which a value is `Low`.
    pub low_percentile: f64,
    /// Percentile above which a value is `High`.
    pub high_percentile: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window: 20,
            low_percentile: 33.0,
            high_percentile: 66.0,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::RegimeWindow(self.window));
        }
        let (low, high) = (self.low_percentile, self.high_percentile);
        if !(low > 0.0 && low < high && high < 100.0) {
            return Err(ConfigError::RegimePercentiles { low, high });
        }
        Ok(())
    }
}

// ─── Rolling window ──────────────────────────────────────────────────

/// Fixed-capacity FIFO of the most recent observations.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
    scratch: Vec<f64>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            scratch: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// `(low, high)` percentiles of the current contents.
    pub fn cut_points(&mut self, low: f64, high: f64) -> (f64, f64) {
        self.scratch.clear();
        self.scratch.extend(self.values.iter().copied());
        self.scratch.sort_by(|a, b| a.total_cmp(b));
        (
            percentile_sorted(&self.scratch, low),
            percentile_sorted(&self.scratch, high),
        )
    }
}

// ─── Classifier ──────────────────────────────────────────────────────

/// Streaming classifier over (volatility, spread, volume) observations.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
    volatility: RollingWindow,
    spread: RollingWindow,
    volume: RollingWindow,
}

impl RegimeClassifier {
    pub fn new(config: RegimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let window = config.window;
        Ok(Self {
            config,
            volatility: RollingWindow::new(window),
            spread: RollingWindow::new(window),
            volume: RollingWindow::new(window),
        })
    }

    /// Label the current period, then add its values to the windows.
    pub fn observe(&mut self, volatility: f64, spread: f64, volume: f64) -> RegimeLabel {
        let label = if self.volatility.is_full() {
            let (low, high) = (self.config.low_percentile, self.config.high_percentile);
            RegimeLabel::Classified {
                volatility: bin(volatility, self.volatility.cut_points(low, high)),
                spread: bin(spread, self.spread.cut_points(low, high)),
                volume: bin(volume, self.volume.cut_points(low, high)),
            }
        } else {
            RegimeLabel::InsufficientHistory
        };
        self.volatility.push(volatility);
        self.spread.push(spread);
        self.volume.push(volume);
        label
    }

    /// Classify a whole series of `(volatility, spread, volume)` observations.
    pub fn classify_series(
        config: RegimeConfig,
        observations: &[(f64, f64, f64)],
    ) -> Result<Vec<RegimeLabel>, ConfigError> {
        let mut classifier = Self::new(config)?;
        Ok(observations
            .iter()
            .map(|&(vol, spread, volume)| classifier.observe(vol, spread, volume))
            .collect())
    }
}

fn bin(value: f64, (low, high): (f64, f64)) -> RegimeLevel {
    if value > high {
        RegimeLevel::High
    } else if value < low {
        RegimeLevel::Low
    } else {
        RegimeLevel::Medium
    }
}
