// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use thiserror::Error;

/// Classifies why a device read or command failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// The name or id does not resolve to a device of the requested kind.
    NotFound,
    /// A sink refused an item: incompatible type or not enough room.
    TransferRejected,
    /// The device does not understand the command.
    Unsupported,
    InvalidState,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::TransferRejected => "transfer rejected",
            Self::Unsupported => "unsupported",
            Self::InvalidState => "invalid state",
        };
        f.write_str(label)
    }
}

/// Error type returned by device registries.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::NotFound, name)
    }

    pub fn transfer_rejected(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::TransferRejected, message)
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::new(
            DeviceErrorKind::Unsupported,
            format!("{} is not supported by this device", operation),
        )
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::InvalidState, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == DeviceErrorKind::NotFound
    }

    pub fn is_transfer_rejected(&self) -> bool {
        self.kind == DeviceErrorKind::TransferRejected
    }
}
