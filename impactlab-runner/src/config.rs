//! TOML run configuration: one file holds the simulation and the experiment.
//!
//! ```toml
//! [simulation]
//! horizon = 120
//! order_size = 100000
//!
//! [monte_carlo]
//! paths = 1000
//! baseline = "twap"
//!
//! [monte_carlo.scenario]
//! kind = "flash_crash"
//! start = 30
//! duration = 15
//! magnitude = 0.05
//! ```
//!
//! Every table and field is optional; missing values take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use impactlab_core::config::{ConfigError, SimulationConfig};

use crate::monte_carlo::MonteCarloConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    pub monte_carlo: MonteCarloConfig,
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.monte_carlo.validate()?;
        if let Some(spec) = &self.monte_carlo.scenario {
            spec.validate(self.simulation.horizon)?;
        }
        Ok(())
    }
}

/// Load and validate a run configuration file.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    RunConfig::from_toml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use impactlab_core::scenario::ScenarioKind;
    use impactlab_core::strategy::StrategyKind;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.monte_carlo.paths, 1_000);
        assert_eq!(config.simulation.horizon, 120);
    }

    #[test]
    fn parses_nested_tables() {
        let text = r#"
            [simulation]
            horizon = 60
            order_size = -50000.0

            [simulation.impact]
            eta = 0.05

            [monte_carlo]
            paths = 200
            threads = 2
            shortfall_mode = "signed"
            strategies = [{ type = "twap" }, { type = "almgren_chriss", urgency = 5.0 }]

            [monte_carlo.scenario]
            kind = "liquidity_drought"
            start = 10
            duration = 20
            magnitude = 0.5
        "#;
        let config = RunConfig::from_toml_str(text).unwrap();
        assert_eq!(config.simulation.horizon, 60);
        assert_eq!(config.simulation.order_size, -50_000.0);
        assert_eq!(config.simulation.impact.eta, 0.05);
        assert_eq!(config.monte_carlo.paths, 200);
        assert_eq!(config.monte_carlo.threads, Some(2));
        assert_eq!(
            config.monte_carlo.strategies,
            Some(vec![
                StrategyKind::Twap,
                StrategyKind::AlmgrenChriss { urgency: 5.0 }
            ])
        );
        let scenario = config.monte_carlo.scenario.unwrap();
        assert_eq!(scenario.kind, ScenarioKind::LiquidityDrought);
        assert_eq!(scenario.duration, 20);
    }

    #[test]
    fn zero_paths_is_rejected_with_message() {
        let err = RunConfig::from_toml_str("[monte_carlo]\npaths = 0").unwrap_err();
        assert_eq!(err, ConfigError::ZeroPaths);
        assert_eq!(err.to_string(), "paths must be at least 1");
    }

    #[test]
    fn scenario_beyond_horizon_is_rejected() {
        let text = r#"
            [simulation]
            horizon = 20

            [monte_carlo.scenario]
            kind = "flash_crash"
            start = 30
            duration = 5
            magnitude = 0.05
        "#;
        let err = RunConfig::from_toml_str(text).unwrap_err();
        assert!(matches!(err, ConfigError::ScenarioOutsideHorizon { .. }));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = RunConfig::default();
        config.monte_carlo.paths = 321;
        config.monte_carlo.threads = Some(3);
        config.monte_carlo.strategies = Some(StrategyKind::standard(2.0));
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/impactlab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/impactlab.toml"));
    }
}
