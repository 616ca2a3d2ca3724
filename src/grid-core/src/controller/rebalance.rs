// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Congestion rebalancer.
//!
//! Producers keep a reserve of free buffer volume. When one falls below it,
//! its largest stack is shed into the least-full sinks until the reserve is
//! restored or the sinks run out. The pass is greedy and single-shot: a
//! producer that is not fully relieved is simply looked at again next run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::command::DeviceCommand;
use crate::device::response::DeviceError;
use crate::device::state::{Item, StorageReading};
use crate::device::{DeviceId, DeviceRegistry};
use crate::telemetry::{publish, publish_to, DisplaySurface, TextSurface};

use super::config::BalancerConfig;
use super::events::{ControlEventEmitter, ControlListener, ListenerId};

const PASS: &str = "balancer";
const PANEL_WIDTH: usize = 30;

/// Nodes whose headroom has fallen below `reserve`.
pub fn list_congested(nodes: &[StorageReading], reserve: f64) -> Vec<StorageReading> {
    nodes
        .iter()
        .filter(|n| n.max_volume - n.current_volume < reserve)
        .cloned()
        .collect()
}

/// Nodes below `fill_limit`, least full first.
pub fn list_sinks(nodes: &[StorageReading], fill_limit: f64) -> Vec<StorageReading> {
    let mut sinks: Vec<StorageReading> = nodes
        .iter()
        .filter(|n| n.fill_factor() < fill_limit)
        .cloned()
        .collect();
    sinks.sort_by(|a, b| a.fill_factor().total_cmp(&b.fill_factor()));
    sinks
}

/// The stack with the largest quantity.
pub fn heaviest_item(items: &[Item]) -> Option<&Item> {
    items
        .iter()
        .filter(|i| i.amount > 0.0)
        .max_by(|a, b| a.amount.total_cmp(&b.amount))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub from: DeviceId,
    pub to: DeviceId,
    pub item: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferFailure {
    pub item: String,
    pub from: String,
    pub to: String,
    pub error: DeviceError,
}

/// What happened to one congested node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRelief {
    pub node: DeviceId,
    /// Deficit when processing of this node started.
    pub volume_to_free: f64,
    pub moved: f64,
    pub attempts: usize,
    pub transfers: Vec<Transfer>,
    pub failures: Vec<TransferFailure>,
}

impl NodeRelief {
    fn new(node: DeviceId, volume_to_free: f64) -> Self {
        Self {
            node,
            volume_to_free,
            moved: 0.0,
            attempts: 0,
            transfers: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_relieved(&self) -> bool {
        self.moved >= self.volume_to_free
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RebalanceOutcome {
    /// A producer or sink group is missing; nothing was moved.
    ConfigurationError { entity: String },
    Completed,
}

#[derive(Debug, Clone)]
pub struct RebalanceReport {
    pub outcome: RebalanceOutcome,
    pub producers: usize,
    pub congested: usize,
    pub sinks_total: usize,
    pub sinks_free: usize,
    pub reliefs: Vec<NodeRelief>,
    /// Summary panel.
    pub status_lines: Vec<String>,
    /// One block per failed transfer.
    pub debug_lines: Vec<String>,
}

impl RebalanceReport {
    fn configuration_error(entity: String) -> Self {
        Self {
            status_lines: vec![format!("[CFG ERR]: entity not found: {}", entity)],
            outcome: RebalanceOutcome::ConfigurationError { entity },
            producers: 0,
            congested: 0,
            sinks_total: 0,
            sinks_free: 0,
            reliefs: Vec::new(),
            debug_lines: Vec::new(),
        }
    }

    pub fn total_moved(&self) -> f64 {
        self.reliefs.iter().map(|r| r.moved).sum()
    }
}

pub struct Rebalancer {
    config: BalancerConfig,
    emitter: ControlEventEmitter,
}

impl Rebalancer {
    pub fn new(config: BalancerConfig) -> Self {
        Self {
            config,
            emitter: ControlEventEmitter::new(),
        }
    }

    pub fn register(&mut self, listener: Arc<dyn ControlListener>) -> ListenerId {
        self.emitter.register(listener)
    }

    /// Run one rebalancing pass and publish the summary.
    ///
    /// The status panel goes to `status_display` (or `fallback`); failures go
    /// to `debug_display` when it resolves and are otherwise only logged.
    pub fn run(
        &self,
        registry: &mut dyn DeviceRegistry,
        fallback: &mut dyn TextSurface,
    ) -> RebalanceReport {
        let status_display = self
            .config
            .status_display
            .as_deref()
            .and_then(|name| registry.device(name).ok());
        let debug_display = self
            .config
            .debug_display
            .as_deref()
            .and_then(|name| registry.device(name).ok());

        let report = self.rebalance(registry);
        publish_to(registry, status_display, fallback, &report.status_lines);
        if let Some(id) = debug_display {
            publish(&mut DisplaySurface::new(registry, id), &report.debug_lines);
        }
        report
    }

    /// Run one rebalancing pass without publishing anything.
    pub fn rebalance(&self, registry: &mut dyn DeviceRegistry) -> RebalanceReport {
        let cfg = &self.config;
        let producers = match registry.storage_in(&cfg.producer_group) {
            Ok(nodes) => nodes,
            Err(_) => return self.missing(format!("producer group '{}'", cfg.producer_group)),
        };
        let sink_nodes = match registry.storage_in(&cfg.sink_group) {
            Ok(nodes) => nodes,
            Err(_) => return self.missing(format!("sink group '{}'", cfg.sink_group)),
        };

        let congested = list_congested(&producers, cfg.reserve_volume);
        let sinks = list_sinks(&sink_nodes, cfg.sink_fill_limit);
        debug!(
            "{} of {} producers congested, {} of {} sinks with room",
            congested.len(),
            producers.len(),
            sinks.len(),
            sink_nodes.len()
        );

        let reliefs: Vec<NodeRelief> = congested
            .iter()
            .map(|node| self.relieve(registry, node, &sinks))
            .collect();

        let status_lines = summary_panel(producers.len(), congested.len(), sink_nodes.len(), sinks.len());
        let debug_lines = reliefs
            .iter()
            .flat_map(|r| r.failures.iter())
            .flat_map(|f| {
                [
                    format!("Unable to transfer item {}", f.item),
                    format!("     from {}", f.from),
                    format!("     to {}", f.to),
                ]
            })
            .collect();

        RebalanceReport {
            outcome: RebalanceOutcome::Completed,
            producers: producers.len(),
            congested: congested.len(),
            sinks_total: sink_nodes.len(),
            sinks_free: sinks.len(),
            reliefs,
            status_lines,
            debug_lines,
        }
    }

    fn missing(&self, entity: String) -> RebalanceReport {
        warn!("Balancer configuration error: {} not found", entity);
        self.emitter.notify_configuration_error(PASS, &entity);
        RebalanceReport::configuration_error(entity)
    }

    /// Shed the largest stack of `node` into `sinks`, in order.
    ///
    /// Moves at most the deficit measured on entry, never more than a sink's
    /// free volume per call, and tries each sink at most once.
    pub fn relieve(
        &self,
        registry: &mut dyn DeviceRegistry,
        node: &StorageReading,
        sinks: &[StorageReading],
    ) -> NodeRelief {
        let reserve = self.config.reserve_volume;
        let initial = reserve - node.free_volume();
        let mut relief = NodeRelief::new(node.id, initial);
        if initial <= 0.0 {
            return relief;
        }

        let items = match registry.items(node.id) {
            Ok(items) => items,
            Err(e) => {
                warn!("Cannot list items of {}: {}", node.name, e);
                return relief;
            }
        };
        let Some(item) = heaviest_item(&items).cloned() else {
            debug!("{} is congested but holds no items", node.name);
            return relief;
        };

        let mut volume_to_free = initial;
        let mut item_left = item.amount;
        for sink in sinks {
            if volume_to_free <= 0.0 || item_left <= 0.0 {
                break;
            }
            if sink.id == node.id {
                continue;
            }
            let sink_free = registry
                .storage(sink.id)
                .map(|s| s.free_volume())
                .unwrap_or_else(|_| sink.free_volume());
            let amount = sink_free.min(volume_to_free).min(item_left);
            if amount <= 0.0 {
                continue;
            }

            relief.attempts += 1;
            let cmd = DeviceCommand::TransferItem {
                to: sink.id,
                item: item.kind.clone(),
                amount,
            };
            match registry.apply(node.id, cmd) {
                Ok(()) => {
                    relief.moved += amount;
                    item_left -= amount;
                    relief.transfers.push(Transfer {
                        from: node.id,
                        to: sink.id,
                        item: item.kind.clone(),
                        amount,
                    });
                    self.emitter
                        .notify_transfer(node.id, sink.id, &item.kind, amount);
                    // Re-read the source, but never let the budget grow back.
                    let remaining = initial - relief.moved;
                    volume_to_free = match registry.storage(node.id) {
                        Ok(updated) => (reserve - updated.free_volume()).min(remaining),
                        Err(_) => remaining,
                    };
                }
                Err(e) => {
                    warn!(
                        "Unable to transfer {} from {} to {}: {}",
                        item.kind, node.name, sink.name, e
                    );
                    self.emitter
                        .notify_transfer_failed(node.id, sink.id, &item.kind, &e);
                    relief.failures.push(TransferFailure {
                        item: item.kind.clone(),
                        from: node.name.clone(),
                        to: sink.name.clone(),
                        error: e,
                    });
                }
            }
        }

        if relief.moved > 0.0 {
            info!(
                "Moved {:.2} of {} out of {} ({:.2} requested)",
                relief.moved, item.kind, node.name, initial
            );
        }
        relief
    }
}

fn summary_panel(producers: usize, congested: usize, sinks: usize, free: usize) -> Vec<String> {
    let counter = |label: &str, value: usize| format!("* {:.<24}: {:>4} *", label, value);
    let note = |text: &str| format!("* {:<width$} *", text, width = PANEL_WIDTH);
    vec![
        "********* LOAD BALANCER **********".to_string(),
        counter("Producers found", producers),
        note("   of which"),
        counter("      congested", congested),
        counter("Sinks found", sinks),
        note("   of which"),
        counter("      with free space", free),
        "*".repeat(PANEL_WIDTH + 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::FakeGrid;
    use crate::telemetry::BufferSurface;

    fn node(id: u64, current: f64, max: f64) -> StorageReading {
        StorageReading {
            id: DeviceId(id),
            name: format!("Node {}", id),
            current_volume: current,
            max_volume: max,
        }
    }

    #[test]
    fn test_list_congested() {
        let nodes = vec![node(1, 9.0, 10.0), node(2, 8.0, 10.0), node(3, 2.0, 10.0)];
        let congested = list_congested(&nodes, 2.0);
        assert_eq!(congested.len(), 1);
        assert_eq!(congested[0].id, DeviceId(1));
    }

    #[test]
    fn test_list_sinks_ascending_fill() {
        let nodes = vec![
            node(1, 9.0, 10.0),
            node(2, 9.95, 10.0),
            node(3, 1.0, 10.0),
            node(4, 0.0, 0.0),
        ];
        let sinks = list_sinks(&nodes, 0.99);
        let ids: Vec<u64> = sinks.iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_heaviest_item() {
        let items = vec![
            Item::new("Steel Plate", 3.0),
            Item::new("Motor", 7.0),
            Item::new("Girder", 1.0),
        ];
        assert_eq!(heaviest_item(&items).unwrap().kind, "Motor");
        assert!(heaviest_item(&[]).is_none());
    }

    /// Producer at 9/10 with 6 plates and 3 motors.
    fn producer_grid() -> (FakeGrid, DeviceId) {
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 9.0, 10.0, 1);
        grid.set_items(
            producer,
            vec![Item::new("Steel Plate", 6.0), Item::new("Motor", 3.0)],
        );
        grid.add_group("Assemblers", &[producer]);
        (grid, producer)
    }

    fn rebalancer(reserve: f64) -> Rebalancer {
        Rebalancer::new(BalancerConfig {
            reserve_volume: reserve,
            sink_fill_limit: 0.99,
            ..BalancerConfig::default()
        })
    }

    #[test]
    fn test_split_across_sinks() {
        // Needs 2.0 freed; the least full sink only has room for 1.0.
        let (mut grid, producer) = producer_grid();
        let s1 = grid.add_storage("Cargo 1", 0.0, 1.0, 1);
        let s2 = grid.add_storage("Cargo 2", 45.0, 50.0, 1);
        grid.add_group("Cargo", &[s2, s1]);

        let report = rebalancer(3.0).rebalance(&mut grid);

        assert_eq!(report.outcome, RebalanceOutcome::Completed);
        assert_eq!(report.congested, 1);
        let relief = &report.reliefs[0];
        assert_eq!(relief.volume_to_free, 2.0);
        assert_eq!(
            relief.transfers,
            vec![
                Transfer {
                    from: producer,
                    to: s1,
                    item: "Steel Plate".to_string(),
                    amount: 1.0,
                },
                Transfer {
                    from: producer,
                    to: s2,
                    item: "Steel Plate".to_string(),
                    amount: 1.0,
                },
            ]
        );
        assert_eq!(relief.moved, 2.0);
        assert_eq!(relief.attempts, 2);
        assert!(relief.is_relieved());
        assert_eq!(grid.storage(producer).unwrap().current_volume, 7.0);
    }

    #[test]
    fn test_failed_transfer_moves_on() {
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 9.5, 10.0, 1);
        grid.set_items(producer, vec![Item::new("Motor", 9.5)]);
        let s1 = grid.add_storage("Cargo 1", 0.0, 10.0, 1);
        let s2 = grid.add_storage("Cargo 2", 5.0, 10.0, 1);
        grid.reject_transfers_to(s1);
        grid.add_group("Assemblers", &[producer]);
        grid.add_group("Cargo", &[s1, s2]);

        let report = rebalancer(2.0).rebalance(&mut grid);
        let relief = &report.reliefs[0];

        assert_eq!(relief.failures.len(), 1);
        assert_eq!(relief.failures[0].to, "Cargo 1");
        assert!(relief.failures[0].error.is_transfer_rejected());
        assert_eq!(relief.transfers.len(), 1);
        assert_eq!(relief.transfers[0].to, s2);
        assert_eq!(relief.moved, 1.5);
        assert_eq!(
            report.debug_lines,
            vec![
                "Unable to transfer item Motor".to_string(),
                "     from Assembler 1".to_string(),
                "     to Cargo 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_last_sink_is_used() {
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 10.0, 10.0, 1);
        grid.set_items(producer, vec![Item::new("Motor", 10.0)]);
        let only = grid.add_storage("Cargo 1", 0.0, 10.0, 1);
        grid.add_group("Assemblers", &[producer]);
        grid.add_group("Cargo", &[only]);

        let report = rebalancer(2.0).rebalance(&mut grid);
        assert_eq!(report.reliefs[0].transfers.len(), 1);
        assert_eq!(report.total_moved(), 2.0);
    }

    #[test]
    fn test_node_never_sinks_into_itself() {
        // The producer is also in the sink group and is the least full sink.
        let (mut grid, producer) = producer_grid();
        let cargo = grid.add_storage("Cargo 1", 9.5, 10.0, 1);
        grid.add_group("Cargo", &[cargo, producer]);

        let report = rebalancer(3.0).rebalance(&mut grid);

        assert_eq!(report.sinks_total, 2);
        let relief = &report.reliefs[0];
        assert_eq!(relief.attempts, 1);
        assert!(relief.transfers.iter().all(|t| t.to != producer));
        assert!(relief.failures.is_empty());
        assert_eq!(relief.moved, 0.5);
        assert!(grid.commands.iter().all(|(_, cmd)| !matches!(
            cmd,
            DeviceCommand::TransferItem { to, .. } if *to == producer
        )));
    }

    #[test]
    fn test_moved_never_exceeds_deficit_or_sink_room() {
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 10.0, 10.0, 1);
        grid.set_items(producer, vec![Item::new("Motor", 10.0)]);
        let mut sinks = Vec::new();
        for i in 0..5 {
            sinks.push(grid.add_storage(&format!("Cargo {}", i), 9.3, 10.0, 1));
        }
        grid.add_group("Assemblers", &[producer]);
        grid.add_group("Cargo", &sinks);

        let report = rebalancer(2.5).rebalance(&mut grid);
        let relief = &report.reliefs[0];

        assert!(relief.moved <= relief.volume_to_free + 1e-9);
        assert!(relief.attempts <= sinks.len());
        for t in &relief.transfers {
            assert!(t.amount <= 0.7 + 1e-9);
        }
    }

    #[test]
    fn test_single_item_type_per_node() {
        // Only the heaviest stack moves, even if it runs out.
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 10.0, 10.0, 1);
        grid.set_items(
            producer,
            vec![Item::new("Motor", 1.0), Item::new("Girder", 0.5)],
        );
        let sink = grid.add_storage("Cargo 1", 0.0, 50.0, 1);
        grid.add_group("Assemblers", &[producer]);
        grid.add_group("Cargo", &[sink]);

        let report = rebalancer(2.0).rebalance(&mut grid);
        let relief = &report.reliefs[0];
        assert_eq!(relief.moved, 1.0);
        assert!(!relief.is_relieved());
        assert!(relief.transfers.iter().all(|t| t.item == "Motor"));
    }

    #[test]
    fn test_missing_group_is_configuration_error() {
        let mut grid = FakeGrid::new();
        let producer = grid.add_storage("Assembler 1", 10.0, 10.0, 1);
        grid.add_group("Assemblers", &[producer]);
        let mut fallback = BufferSurface::new();

        let report = rebalancer(2.0).run(&mut grid, &mut fallback);

        assert_eq!(
            report.outcome,
            RebalanceOutcome::ConfigurationError {
                entity: "sink group 'Cargo'".to_string()
            }
        );
        assert!(grid.commands.is_empty());
        assert_eq!(
            fallback.text(),
            "[CFG ERR]: entity not found: sink group 'Cargo'\n"
        );
    }

    #[test]
    fn test_status_panel() {
        let (mut grid, _) = producer_grid();
        let sink = grid.add_storage("Cargo 1", 0.0, 10.0, 1);
        grid.add_group("Cargo", &[sink]);
        let status = grid.add_plain("Balancer.Status");
        let debug = grid.add_plain("Balancer.Debug");
        grid.write_text(debug, "old failure\n", false).unwrap();
        let mut fallback = BufferSurface::new();

        rebalancer(3.0).run(&mut grid, &mut fallback);

        let panel = grid.texts.get(&status).unwrap();
        let rows: Vec<&str> = panel.lines().collect();
        assert_eq!(rows[0], "********* LOAD BALANCER **********");
        assert_eq!(rows[1], "* Producers found.........:    1 *");
        assert_eq!(rows[3], "*       congested.........:    1 *");
        assert!(rows.iter().all(|r| r.chars().count() == 34));
        assert_eq!(grid.texts.get(&debug).unwrap(), "");
        assert_eq!(fallback.text(), "");
    }
}
