// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::device::DeviceId;

/// Linear actuator (piston) as read at the start of a tick.
///
/// Holds `position <= limit <= max` for well-behaved devices.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorReading {
    pub id: DeviceId,
    pub name: String,
    /// Current extension.
    pub position: f64,
    /// Configured travel limit.
    pub limit: f64,
    /// Maximum reachable extension.
    pub max: f64,
}

/// Rotary joint angle in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct RotaryReading {
    pub id: DeviceId,
    pub name: String,
    pub angle: f64,
}

/// Designated inventory of a storage-bearing device.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageReading {
    pub id: DeviceId,
    /// Display name of the owning device.
    pub name: String,
    pub current_volume: f64,
    pub max_volume: f64,
}

impl StorageReading {
    /// Remaining headroom, never negative.
    pub fn free_volume(&self) -> f64 {
        (self.max_volume - self.current_volume).max(0.0)
    }

    /// `current / max`; a zero-capacity inventory counts as full.
    pub fn fill_factor(&self) -> f64 {
        if self.max_volume > 0.0 {
            self.current_volume / self.max_volume
        } else {
            1.0
        }
    }
}

/// A stack of one item type.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: String,
    /// Quantity, expressed in volume units.
    pub amount: f64,
}

impl Item {
    pub fn new(kind: impl Into<String>, amount: f64) -> Self {
        Self {
            kind: kind.into(),
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(current: f64, max: f64) -> StorageReading {
        StorageReading {
            id: DeviceId(1),
            name: "Cargo".to_string(),
            current_volume: current,
            max_volume: max,
        }
    }

    #[test]
    fn test_free_volume() {
        assert_eq!(node(3.0, 10.0).free_volume(), 7.0);
        assert_eq!(node(12.0, 10.0).free_volume(), 0.0);
    }

    #[test]
    fn test_fill_factor() {
        assert_eq!(node(5.0, 10.0).fill_factor(), 0.5);
        assert_eq!(node(0.0, 0.0).fill_factor(), 1.0);
    }
}
