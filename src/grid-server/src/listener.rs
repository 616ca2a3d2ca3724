// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Mirrors controller decisions into the log.
//!
//! The controllers already log their own warnings; this adds producer
//! state transitions and a debug trace of every event.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, info};

use grid_core::controller::{ControlListener, FillRatio, RotationTarget};
use grid_core::{DeviceError, DeviceId};

const PRODUCERS_UNKNOWN: u8 = 0;
const PRODUCERS_RUNNING: u8 = 1;
const PRODUCERS_STOPPED: u8 = 2;

/// Backpressure is reported every tick; only changes are logged at info.
pub struct TracingListener {
    producers: AtomicU8,
}

impl TracingListener {
    pub fn new() -> Self {
        Self {
            producers: AtomicU8::new(PRODUCERS_UNKNOWN),
        }
    }
}

impl Default for TracingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlListener for TracingListener {
    fn on_configuration_error(&self, pass: &'static str, entity: &str) {
        debug!("[{}] skipped, entity not found: {}", pass, entity);
    }

    fn on_backpressure(&self, engaged: bool, ratio: FillRatio) {
        let now = if engaged {
            PRODUCERS_STOPPED
        } else {
            PRODUCERS_RUNNING
        };
        if self.producers.swap(now, Ordering::Relaxed) == now {
            debug!("Storage at {}", ratio);
        } else if engaged {
            info!("Storage at {}, stopping drills", ratio);
        } else {
            info!("Storage at {}, drills running", ratio);
        }
    }

    fn on_target_flip(&self, old: RotationTarget, new: RotationTarget) {
        debug!("Rotation target {} -> {}", old, new);
    }

    fn on_advance(&self, actuator: DeviceId, name: &str) {
        debug!("Extending {} ({})", name, actuator);
    }

    fn on_fully_extended(&self) {
        debug!("Nothing left to extend");
    }

    fn on_transfer(&self, from: DeviceId, to: DeviceId, item: &str, amount: f64) {
        debug!("Moved {:.2} {} from {} to {}", amount, item, from, to);
    }

    fn on_transfer_failed(&self, from: DeviceId, to: DeviceId, item: &str, error: &DeviceError) {
        debug!("Transfer of {} from {} to {} failed: {}", item, from, to, error);
    }
}
