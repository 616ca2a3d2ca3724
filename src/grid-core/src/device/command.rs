// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::device::DeviceId;

/// Command sent to a single device.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    SetEnabled(bool),
    /// Start moving an actuator towards its travel limit.
    Extend,
    /// Raise an actuator's travel limit by one step, capped at its maximum.
    RaiseLimit,
    /// Move `amount` volume units of `item` from the commanded device's
    /// inventory into `to`.
    TransferItem {
        to: DeviceId,
        item: String,
        amount: f64,
    },
}

impl DeviceCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetEnabled(true) => "Enable",
            Self::SetEnabled(false) => "Disable",
            Self::Extend => "Extend",
            Self::RaiseLimit => "RaiseLimit",
            Self::TransferItem { .. } => "TransferItem",
        }
    }
}
