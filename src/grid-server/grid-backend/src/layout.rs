// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Ready-made grids, named after the devices the controllers are configured
//! to look for.

use grid_core::controller::{BalancerConfig, DrillConfig};

use crate::sim::SimGrid;

const RIG_NETWORK: u32 = 1;
const FACTORY_NETWORK: u32 = 2;

/// Drill rig only: pistons, rotor, two drills and a rig cargo container.
pub fn drill_rig(drill: &DrillConfig) -> SimGrid {
    let mut grid = SimGrid::new();
    add_drill_rig(&mut grid, drill);
    grid
}

/// Drill rig plus an assembler line feeding two cargo sinks.
///
/// The first sink only takes steel plates, so motors bounce off it.
pub fn demo(drill: &DrillConfig, balancer: &BalancerConfig) -> SimGrid {
    let mut grid = SimGrid::new();
    add_drill_rig(&mut grid, drill);

    let assemblers = [
        grid.add_assembler("Assembler 1", "Steel Plate", 0.05, 8.0, FACTORY_NETWORK),
        grid.add_assembler("Assembler 2", "Motor", 0.08, 8.0, FACTORY_NETWORK),
    ];
    grid.add_group(&balancer.producer_group, &assemblers);

    let plates = grid.add_filtered_cargo("Cargo 1", 20.0, FACTORY_NETWORK, &["Steel Plate"]);
    let general = grid.add_cargo("Cargo 2", 40.0, FACTORY_NETWORK);
    grid.add_group(&balancer.sink_group, &[plates, general]);

    for name in [&balancer.status_display, &balancer.debug_display]
        .into_iter()
        .flatten()
    {
        grid.add_display(name);
    }
    grid
}

fn add_drill_rig(grid: &mut SimGrid, drill: &DrillConfig) {
    let pistons: Vec<_> = (1..=3)
        .map(|n| grid.add_piston(&format!("Piston {}", n), 0.0, 0.0, 10.0, 0.1))
        .collect();
    grid.add_group(&drill.actuator_group, &pistons);

    grid.add_rotor(&drill.rotary_joint, 0.2, 0.05);
    grid.add_light(&drill.indicator);
    if let Some(display) = &drill.display {
        grid.add_display(display);
    }

    let drills = [
        grid.add_drill("Drill 1", "Stone", 0.05, 5.0, RIG_NETWORK),
        grid.add_drill("Drill 2", "Stone", 0.05, 5.0, RIG_NETWORK),
    ];
    grid.add_group(&drill.rig_group, &drills);
    grid.add_cargo("Rig Cargo", 200.0, RIG_NETWORK);
}
