// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod controller;
pub mod device;
pub mod telemetry;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use device::command::DeviceCommand;
pub use device::response::{DeviceError, DeviceErrorKind, DeviceResult};
pub use device::state::{ActuatorReading, Item, RotaryReading, StorageReading};
pub use device::{DeviceId, DeviceRef, DeviceRegistry};
pub use telemetry::{publish, BufferSurface, TextSurface};
