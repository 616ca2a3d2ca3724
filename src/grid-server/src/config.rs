// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for gridctl.
//!
//! Config is loaded from the `[gridctl]` section of `gridctl.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./gridctl.toml`
//! 3. `~/.config/gridctl/gridctl.toml`
//! 4. `/etc/gridctl/gridctl.toml`

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use grid_app::{ConfigError, ConfigFile};
use grid_core::controller::{BalancerConfig, DrillConfig, OrderingKey};

/// Top-level configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Tick cadence
    pub schedule: ScheduleConfig,
    /// Simulated grid
    pub simulation: SimulationConfig,
    /// Drill advancement controller
    pub drill: DrillConfig,
    /// Congestion rebalancer
    pub balancer: BalancerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time between drill passes; 166 ms is every 10th frame at 60 Hz
    pub tick_interval_ms: u64,
    /// Run the rebalancer on every Nth tick
    pub balancer_every: u32,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 166,
            balancer_every: 10,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Built-in grid layout ("demo", "drill-rig")
    pub layout: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            layout: "demo".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        if self.schedule.tick_interval_ms == 0 {
            return Err("[schedule].tick_interval_ms must be > 0".to_string());
        }
        if self.schedule.balancer_every == 0 {
            return Err("[schedule].balancer_every must be > 0".to_string());
        }
        if self.schedule.max_ticks == Some(0) {
            return Err("[schedule].max_ticks must be > 0 when set".to_string());
        }
        if self.simulation.layout.trim().is_empty() {
            return Err("[simulation].layout must not be empty".to_string());
        }

        let drill = &self.drill;
        for (key, value) in [
            ("actuator_group", &drill.actuator_group),
            ("rig_group", &drill.rig_group),
            ("rotary_joint", &drill.rotary_joint),
            ("indicator", &drill.indicator),
        ] {
            if value.trim().is_empty() {
                return Err(format!("[drill].{} must not be empty", key));
            }
        }
        if !(drill.angle_threshold > 0.0 && drill.angle_threshold < PI / 2.0) {
            return Err("[drill].angle_threshold must be in range 0..π/2".to_string());
        }
        if !(drill.fill_threshold > 0.0 && drill.fill_threshold <= 1.0) {
            return Err("[drill].fill_threshold must be in range 0..=1".to_string());
        }
        OrderingKey::new(&drill.index_pattern)
            .map_err(|e| format!("[drill].index_pattern is invalid: {}", e))?;

        let balancer = &self.balancer;
        if balancer.enabled {
            if balancer.producer_group.trim().is_empty() || balancer.sink_group.trim().is_empty() {
                return Err(
                    "[balancer].producer_group and sink_group must not be empty".to_string(),
                );
            }
            if !(balancer.reserve_volume >= 0.0 && balancer.reserve_volume.is_finite()) {
                return Err("[balancer].reserve_volume must be >= 0".to_string());
            }
            if !(balancer.sink_fill_limit > 0.0 && balancer.sink_fill_limit <= 1.0) {
                return Err("[balancer].sink_fill_limit must be in range 0..=1".to_string());
            }
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        <Self as ConfigFile>::load_from_file(path)
    }

    /// Load configuration from the default search paths.
    /// Returns default config if no config file is found.
    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        <Self as ConfigFile>::load_from_default_paths()
    }

    /// Generate an example configuration wrapped under the `[gridctl]`
    /// section header.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "gridctl")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            schedule: ScheduleConfig::default(),
            simulation: SimulationConfig::default(),
            drill: DrillConfig::default(),
            balancer: BalancerConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "gridctl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_core::controller::ExtensionCheck;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.schedule.tick_interval_ms, 166);
        assert_eq!(config.schedule.balancer_every, 10);
        assert_eq!(config.schedule.max_ticks, None);
        assert_eq!(config.simulation.layout, "demo");
        assert_eq!(config.drill.actuator_group, "Drill.Pistons");
        assert_eq!(config.drill.extension_check, ExtensionCheck::Limit);
        assert!(config.balancer.enabled);
        assert_eq!(config.balancer.reserve_volume, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[gridctl.general]
log_level = "debug"

[gridctl.schedule]
tick_interval_ms = 100
balancer_every = 5
max_ticks = 600

[gridctl.simulation]
layout = "drill-rig"

[gridctl.drill]
actuator_group = "Rig A Pistons"
display = "Rig A Panel"
fill_threshold = 0.8
extension_check = "position"
index_pattern = '^Piston #(?P<index>\d+)'

[gridctl.balancer]
enabled = false
reserve_volume = 4.5
"#;

        let config = ServerConfig::load_from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, Some("debug".to_string()));
        assert_eq!(config.schedule.tick_interval_ms, 100);
        assert_eq!(config.schedule.balancer_every, 5);
        assert_eq!(config.schedule.max_ticks, Some(600));
        assert_eq!(config.simulation.layout, "drill-rig");
        assert_eq!(config.drill.actuator_group, "Rig A Pistons");
        assert_eq!(config.drill.display, Some("Rig A Panel".to_string()));
        assert_eq!(config.drill.fill_threshold, 0.8);
        assert_eq!(config.drill.extension_check, ExtensionCheck::Position);
        assert_eq!(config.drill.rig_group, "Drill.Drills");
        assert!(!config.balancer.enabled);
        assert_eq!(config.balancer.reserve_volume, 4.5);
        assert_eq!(config.balancer.sink_group, "Cargo");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_section_uses_defaults() {
        let config = ServerConfig::load_from_str("[gridctl]\n").unwrap();
        assert_eq!(config.schedule.tick_interval_ms, 166);
        assert_eq!(config.drill.display, Some("Drill.TextPanel".to_string()));
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = ServerConfig::example_combined_toml();
        let config = ServerConfig::load_from_str(&example).unwrap();
        assert_eq!(config.general.log_level, Some("info".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ServerConfig::default();
        config.general.log_level = Some("loud".to_string());
        assert!(config.validate().unwrap_err().contains("log_level"));

        let mut config = ServerConfig::default();
        config.schedule.balancer_every = 0;
        assert!(config.validate().unwrap_err().contains("balancer_every"));

        let mut config = ServerConfig::default();
        config.drill.fill_threshold = 1.5;
        assert!(config.validate().unwrap_err().contains("fill_threshold"));

        let mut config = ServerConfig::default();
        config.drill.angle_threshold = 0.0;
        assert!(config.validate().unwrap_err().contains("angle_threshold"));

        let mut config = ServerConfig::default();
        config.drill.rotary_joint = " ".to_string();
        assert!(config.validate().unwrap_err().contains("rotary_joint"));
    }

    #[test]
    fn test_validate_rejects_pattern_without_index() {
        let mut config = ServerConfig::default();
        config.drill.index_pattern = r"(\d+)$".to_string();
        assert!(config.validate().unwrap_err().contains("index_pattern"));
    }

    #[test]
    fn test_disabled_balancer_skips_its_checks() {
        let mut config = ServerConfig::default();
        config.balancer.enabled = false;
        config.balancer.sink_fill_limit = 0.0;
        assert!(config.validate().is_ok());
    }
}
