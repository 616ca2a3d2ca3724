// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Grid controller components.
//!
//! Two independent passes run on every tick: the drill advancement
//! controller, which owns the rotation state machine and gates producers on
//! downstream capacity, and the congestion rebalancer, which moves material
//! out of clogged producers into under-full sinks.

pub mod capacity;
pub mod config;
pub mod drill;
pub mod events;
pub mod machine;
pub mod policies;
pub mod rebalance;

#[cfg(test)]
pub(crate) mod testing;

pub use capacity::{CapacityMonitor, CapacityReport, FillRatio};
pub use config::{BalancerConfig, DrillConfig, ExtensionCheck};
pub use drill::{DrillController, DrillOutcome, DrillReport};
pub use events::{ControlEventEmitter, ControlListener, ListenerId};
pub use machine::{is_rotation_complete, RotationState, RotationTarget};
pub use policies::{
    select_current_actuator, ExtensionPolicy, LimitReached, OrderingKey, OrderingKeyError,
    PositionReached,
};
pub use rebalance::{
    heaviest_item, list_congested, list_sinks, NodeRelief, RebalanceOutcome, RebalanceReport,
    Rebalancer, Transfer, TransferFailure,
};
