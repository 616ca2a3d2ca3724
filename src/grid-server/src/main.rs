// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod listener;
mod tick_task;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use grid_app::init_logging;
use grid_backend::{register_builtin_layouts_on, LayoutRegistry};
use grid_core::controller::{ControlListener, DrillController, Rebalancer};
use grid_core::DynResult;

use config::ServerConfig;
use listener::TracingListener;
use tick_task::{run_tick_task, TickTaskConfig};

const PKG_DESCRIPTION: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " - drill rig and load balancer controller"
);

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Grid layout to simulate (e.g. demo, drill-rig)
    #[arg(short = 'l', long = "layout")]
    layout: Option<String>,
    /// Stop after this many ticks
    #[arg(short = 'n', long = "ticks")]
    ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let mut layouts = LayoutRegistry::new();
    register_builtin_layouts_on(&mut layouts);

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_combined_toml());
        return Ok(());
    }

    let (cfg, config_path) = if let Some(ref path) = cli.config {
        let cfg = ServerConfig::load_from_file(path)?;
        (cfg, Some(path.clone()))
    } else {
        ServerConfig::load_from_default_paths()?
    };
    cfg.validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    init_logging(cfg.general.log_level.as_deref());

    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let layout = cli
        .layout
        .clone()
        .unwrap_or_else(|| cfg.simulation.layout.clone());
    if !layouts.is_layout_registered(&layout) {
        return Err(format!(
            "Unknown grid layout: {} (available: {})",
            layout,
            layouts.registered_layouts().join(", ")
        )
        .into());
    }
    let grid = layouts.build(&layout, &cfg.drill, &cfg.balancer)?;

    let listener: Arc<dyn ControlListener> = Arc::new(TracingListener::new());
    let mut drill = DrillController::new(cfg.drill.clone())?;
    drill.register(listener.clone());
    let balancer = if cfg.balancer.enabled {
        let mut balancer = Rebalancer::new(cfg.balancer.clone());
        balancer.register(listener);
        Some(balancer)
    } else {
        info!("Load balancer disabled");
        None
    };

    let task_config = TickTaskConfig {
        tick_interval: Duration::from_millis(cfg.schedule.tick_interval_ms),
        balancer_every: cfg.schedule.balancer_every,
        max_ticks: cli.ticks.or(cfg.schedule.max_ticks),
    };
    info!(
        "Starting gridctl (layout: {}, extension check: {})",
        layout,
        cfg.drill.extension_check.policy().name()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Unable to listen for Ctrl+C: {}", e),
        }
    });

    let summary = run_tick_task(task_config, grid, drill, balancer, shutdown_rx).await?;
    info!(
        "Moved {:.2} volume out of congested producers; {} configuration errors",
        summary.volume_moved, summary.configuration_errors
    );
    Ok(())
}
