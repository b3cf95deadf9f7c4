//! greengrid.toml configuration parser.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration describing the stock five-node fleet.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub fleet: FleetConfig,
    pub simulation: SimulationConfig,
    pub forecast: ForecastConfig,
    pub agent: AgentConfig,
}

/// Fleet shape and per-node power model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub node_count: usize,
    /// Watts drawn by an active node at 0% load.
    pub idle_power_w: f64,
    /// Watts drawn by a node at 100% load.
    pub max_power_w: f64,
    /// gCO2/kWh on a clean grid. The fleet starts here.
    pub carbon_low: f64,
    /// gCO2/kWh on a dirty grid.
    pub carbon_high: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            node_count: 5,
            idle_power_w: 50.0,
            max_power_w: 250.0,
            carbon_low: 50.0,
            carbon_high: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Wall-clock seconds per simulated tick (one simulated minute).
    pub tick_seconds: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { tick_seconds: 0.5 }
    }
}

/// Forecaster window and regression-forest parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub window_size: usize,
    /// Samples required before the first training run.
    pub min_samples: usize,
    /// Relative deviation above which a reading is anomalous.
    pub anomaly_tolerance: f64,
    pub trees: usize,
    pub max_depth: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            min_samples: 5,
            anomaly_tolerance: 0.10,
            trees: 20,
            max_depth: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Whether the consolidation agent runs from the first tick.
    pub enabled: bool,
    /// Ticks to wait after a consolidation before evaluating again.
    pub cooldown_ticks: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cooldown_ticks: 3,
        }
    }
}

impl GridConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GridConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        let fleet = &self.fleet;
        if fleet.node_count == 0 {
            return Err(invalid("fleet.node_count must be at least 1"));
        }
        let idle = fleet.idle_power_w;
        if idle.is_nan() || idle < 0.0 || idle > fleet.max_power_w {
            return Err(invalid(format!(
                "fleet.idle_power_w ({}) must be between 0 and fleet.max_power_w ({})",
                fleet.idle_power_w, fleet.max_power_w
            )));
        }
        let tick = self.simulation.tick_seconds;
        if !tick.is_finite() || tick <= 0.0 {
            return Err(invalid("simulation.tick_seconds must be a positive number"));
        }

        let forecast = &self.forecast;
        if forecast.min_samples == 0 {
            return Err(invalid("forecast.min_samples must be at least 1"));
        }
        if forecast.window_size < forecast.min_samples {
            return Err(invalid(format!(
                "forecast.window_size ({}) must be >= forecast.min_samples ({})",
                forecast.window_size, forecast.min_samples
            )));
        }
        if forecast.trees == 0 || forecast.max_depth == 0 {
            return Err(invalid("forecast.trees and forecast.max_depth must be at least 1"));
        }
        if forecast.anomaly_tolerance.is_nan() || forecast.anomaly_tolerance <= 0.0 {
            return Err(invalid("forecast.anomaly_tolerance must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: GridConfig = toml::from_str("").unwrap();
        assert_eq!(config, GridConfig::default());
        assert_eq!(config.fleet.node_count, 5);
        assert_eq!(config.agent.cooldown_ticks, 3);
        config.validate().unwrap();
    }

    #[test]
    fn parse_partial_sections() {
        let toml_str = r#"
[fleet]
node_count = 8
max_power_w = 400.0

[agent]
enabled = true
"#;
        let config: GridConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fleet.node_count, 8);
        assert_eq!(config.fleet.max_power_w, 400.0);
        assert_eq!(config.fleet.idle_power_w, 50.0);
        assert!(config.agent.enabled);
        assert_eq!(config.forecast.window_size, 50);
    }

    #[test]
    fn rejects_zero_nodes() {
        let mut config = GridConfig::default();
        config.fleet.node_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_idle_above_max() {
        let mut config = GridConfig::default();
        config.fleet.idle_power_w = 300.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_window_smaller_than_min_samples() {
        let mut config = GridConfig::default();
        config.forecast.window_size = 3;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_non_positive_tick() {
        let mut config = GridConfig::default();
        config.simulation.tick_seconds = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greengrid.toml");

        let mut config = GridConfig::default();
        config.fleet.node_count = 3;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = GridConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_reports_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greengrid.toml");
        std::fs::write(&path, "[fleet]\nnode_count = 0\n").unwrap();

        let err = GridConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("node_count"));
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GridConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
