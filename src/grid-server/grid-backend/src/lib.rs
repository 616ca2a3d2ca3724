// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;

use grid_core::controller::{BalancerConfig, DrillConfig};
use grid_core::DynResult;

pub mod layout;
mod sim;

pub use sim::{Block, BlockKind, Inventory, SimGrid, DEFAULT_LIMIT_STEP};

pub type LayoutFactory = fn(&DrillConfig, &BalancerConfig) -> SimGrid;

/// Named grid layouts the host can start from.
#[derive(Clone)]
pub struct LayoutRegistry {
    factories: HashMap<String, LayoutFactory>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a layout factory under a stable name (e.g. "demo").
    pub fn register_layout(&mut self, name: &str, factory: LayoutFactory) {
        self.factories.insert(normalize_name(name), factory);
    }

    pub fn is_layout_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_name(name))
    }

    /// List registered layout names.
    pub fn registered_layouts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Build a grid wired for the given controller configuration.
    pub fn build(
        &self,
        name: &str,
        drill: &DrillConfig,
        balancer: &BalancerConfig,
    ) -> DynResult<SimGrid> {
        let factory = self
            .factories
            .get(&normalize_name(name))
            .ok_or_else(|| format!("Unknown grid layout: {}", name))?;
        Ok(factory(drill, balancer))
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, keeping only ASCII alphanumerics.
pub fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Register all built-in layouts on a registry.
pub fn register_builtin_layouts_on(registry: &mut LayoutRegistry) {
    registry.register_layout("demo", layout::demo);
    registry.register_layout("drill-rig", drill_rig_factory);
}

fn drill_rig_factory(drill: &DrillConfig, _balancer: &BalancerConfig) -> SimGrid {
    layout::drill_rig(drill)
}
