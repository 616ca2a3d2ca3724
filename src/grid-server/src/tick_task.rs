// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Tick scheduler driving both controllers over the simulated grid.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use grid_backend::SimGrid;
use grid_core::controller::{
    DrillController, DrillOutcome, RebalanceOutcome, Rebalancer, RotationState,
};
use grid_core::{BufferSurface, DynResult};

#[derive(Debug, Clone)]
pub struct TickTaskConfig {
    pub tick_interval: Duration,
    /// Rebalancer runs when `tick % balancer_every == 0`.
    pub balancer_every: u32,
    pub max_ticks: Option<u64>,
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    pub ticks: u64,
    pub advances: u64,
    pub configuration_errors: u64,
    pub rebalances: u64,
    pub volume_moved: f64,
    pub last_outcome: Option<DrillOutcome>,
}

/// Fallback surface whose contents are logged whenever they change.
struct LoggedSurface {
    label: &'static str,
    surface: BufferSurface,
    last: String,
}

impl LoggedSurface {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            surface: BufferSurface::new(),
            last: String::new(),
        }
    }

    fn flush(&mut self) {
        if self.surface.text() == self.last {
            return;
        }
        for line in self.surface.lines().filter(|l| !l.is_empty()) {
            debug!("[{}] {}", self.label, line);
        }
        self.last = self.surface.text().to_string();
    }
}

/// Run the drill pass every tick and the rebalancer every
/// `balancer_every` ticks until shutdown or `max_ticks`.
pub async fn run_tick_task(
    config: TickTaskConfig,
    mut grid: SimGrid,
    drill: DrillController,
    balancer: Option<Rebalancer>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> DynResult<TickSummary> {
    if config.balancer_every == 0 {
        return Err("balancer_every must be > 0".into());
    }

    let mut interval = time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = RotationState::new();
    let mut drill_out = LoggedSurface::new("drill");
    let mut balancer_out = LoggedSurface::new("balancer");
    let mut summary = TickSummary::default();

    info!(
        "Tick task started ({:?} per tick, balancer every {} ticks)",
        config.tick_interval, config.balancer_every
    );

    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        if config.max_ticks.is_some_and(|max| summary.ticks >= max) {
            info!("Reached {} ticks", summary.ticks);
            break;
        }

        tokio::select! {
            _ = interval.tick() => {
                summary.ticks += 1;

                let report = drill.step(&mut grid, &mut drill_out.surface, state);
                state = report.state;
                match report.outcome {
                    DrillOutcome::Advanced { .. } => summary.advances += 1,
                    DrillOutcome::ConfigurationError { .. } => summary.configuration_errors += 1,
                    DrillOutcome::FullyExtended | DrillOutcome::Waiting { .. } => {}
                }
                summary.last_outcome = Some(report.outcome);
                drill_out.flush();

                if let Some(balancer) = balancer.as_ref() {
                    if summary.ticks % u64::from(config.balancer_every) == 0 {
                        let report = balancer.run(&mut grid, &mut balancer_out.surface);
                        summary.rebalances += 1;
                        summary.volume_moved += report.total_moved();
                        if let RebalanceOutcome::ConfigurationError { .. } = report.outcome {
                            summary.configuration_errors += 1;
                        }
                        balancer_out.flush();
                    }
                }

                grid.advance();
            }
            changed = shutdown_rx.changed() => {
                match changed {
                    Ok(()) if *shutdown_rx.borrow() => break,
                    Ok(()) => {}
                    Err(_) => break,
                }
            }
        }
    }

    info!(
        "Tick task stopped after {} ticks ({} advances, {} rebalances)",
        summary.ticks, summary.advances, summary.rebalances
    );
    Ok(summary)
}
