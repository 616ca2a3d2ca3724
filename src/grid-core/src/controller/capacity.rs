// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Aggregate fill ratio of the storage reachable from a reference inventory.

use std::fmt;

use tracing::debug;

use crate::device::state::StorageReading;
use crate::device::{DeviceId, DeviceRegistry};

/// Aggregate `current / max` volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillRatio {
    /// Always within `[0, 1]`.
    Measured(f64),
    /// Nothing reachable, or all reachable inventories have zero capacity.
    NoReachableCapacity,
}

impl FillRatio {
    /// Numeric value; `NoReachableCapacity` reads as empty.
    pub fn value(self) -> f64 {
        match self {
            Self::Measured(ratio) => ratio,
            Self::NoReachableCapacity => 0.0,
        }
    }

    pub fn exceeds(self, threshold: f64) -> bool {
        self.value() > threshold
    }

    pub fn is_measured(self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

impl fmt::Display for FillRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured(ratio) => write!(f, "{:.2}%", ratio * 100.0),
            Self::NoReachableCapacity => write!(f, "no reachable capacity"),
        }
    }
}

/// Fill ratio over a set of inventories.
pub fn fill_ratio(nodes: &[StorageReading]) -> FillRatio {
    let current: f64 = nodes.iter().map(|n| n.current_volume.max(0.0)).sum();
    let max: f64 = nodes.iter().map(|n| n.max_volume.max(0.0)).sum();
    if max > 0.0 && max.is_finite() {
        FillRatio::Measured((current / max).clamp(0.0, 1.0))
    } else {
        FillRatio::NoReachableCapacity
    }
}

/// Result of one capacity query.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
    pub ratio: FillRatio,
    /// Number of inventories found connected to the reference.
    pub nodes: usize,
    pub current_volume: f64,
    pub max_volume: f64,
}

pub struct CapacityMonitor;

impl CapacityMonitor {
    /// Sum volumes over every storage node connected to `reference`.
    pub fn compute_fill_ratio(registry: &dyn DeviceRegistry, reference: DeviceId) -> CapacityReport {
        let reachable: Vec<StorageReading> = registry
            .storage_nodes()
            .into_iter()
            .filter(|node| registry.is_connected(reference, node.id))
            .collect();

        let ratio = fill_ratio(&reachable);
        let report = CapacityReport {
            ratio,
            nodes: reachable.len(),
            current_volume: reachable.iter().map(|n| n.current_volume).sum(),
            max_volume: reachable.iter().map(|n| n.max_volume).sum(),
        };
        debug!(
            "Capacity from {}: {} over {} inventories",
            reference, report.ratio, report.nodes
        );
        report
    }
}
