// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Static controller settings, supplied once at construction.

use serde::{Deserialize, Serialize};

use super::policies::{ExtensionPolicy, LimitReached, OrderingKey, PositionReached};

/// Which predicate decides that an actuator is fully extended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionCheck {
    /// `limit >= max`
    #[default]
    Limit,
    /// `position >= max`
    Position,
}

impl ExtensionCheck {
    pub fn policy(self) -> Box<dyn ExtensionPolicy> {
        match self {
            Self::Limit => Box::new(LimitReached),
            Self::Position => Box::new(PositionReached),
        }
    }
}

/// Drill advancement controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillConfig {
    /// Group holding the vertical actuators that push the drill head.
    pub actuator_group: String,
    /// Group holding the drills; the first member's inventory is the
    /// reference for the capacity check.
    pub rig_group: String,
    /// Rotary joint spinning the drill head.
    pub rotary_joint: String,
    /// Indicator light (single device or group).
    pub indicator: String,
    /// Status display. Falls back to the host surface when absent.
    pub display: Option<String>,
    /// Half-width of the completion window around the awaited angle, radians.
    pub angle_threshold: f64,
    /// Producers stop when reachable storage is fuller than this.
    pub fill_threshold: f64,
    pub extension_check: ExtensionCheck,
    /// Regex with a named `index` group used to order actuators.
    pub index_pattern: String,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            actuator_group: "Drill.Pistons".to_string(),
            rig_group: "Drill.Drills".to_string(),
            rotary_joint: "Drill.Rotor".to_string(),
            indicator: "Drill.DebugLight".to_string(),
            display: Some("Drill.TextPanel".to_string()),
            angle_threshold: 0.1,
            fill_threshold: 0.9,
            extension_check: ExtensionCheck::Limit,
            index_pattern: OrderingKey::DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Congestion rebalancer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    pub enabled: bool,
    /// Group of producers whose buffers may clog.
    pub producer_group: String,
    /// Group of general storage that can absorb material.
    pub sink_group: String,
    /// Minimum headroom a producer must keep, in volume units.
    pub reserve_volume: f64,
    /// Sinks at or above this fill factor are skipped.
    pub sink_fill_limit: f64,
    /// Display for the summary panel.
    pub status_display: Option<String>,
    /// Display for transfer failures, cleared on every run.
    pub debug_display: Option<String>,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            producer_group: "Assemblers".to_string(),
            sink_group: "Cargo".to_string(),
            reserve_volume: 2.0,
            sink_fill_limit: 0.99,
            status_display: Some("Balancer.Status".to_string()),
            debug_display: Some("Balancer.Debug".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let drill = DrillConfig::default();
        assert_eq!(drill.angle_threshold, 0.1);
        assert_eq!(drill.fill_threshold, 0.9);
        assert_eq!(drill.extension_check, ExtensionCheck::Limit);

        let balancer = BalancerConfig::default();
        assert_eq!(balancer.reserve_volume, 2.0);
        assert_eq!(balancer.sink_fill_limit, 0.99);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
actuator_group = "Rig A Pistons"
extension_check = "position"
"#;
        let cfg: DrillConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.actuator_group, "Rig A Pistons");
        assert_eq!(cfg.extension_check, ExtensionCheck::Position);
        assert_eq!(cfg.rotary_joint, "Drill.Rotor");
        assert_eq!(cfg.extension_check.policy().name(), "position");
    }
}
