// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use crate::device::command::DeviceCommand;
use crate::device::response::{DeviceError, DeviceResult};
use crate::device::state::{ActuatorReading, Item, RotaryReading, StorageReading};

pub mod command;
pub mod response;
pub mod state;

/// Stable handle of a device on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved device handle: either one device or every member of a named group.
///
/// Callers switch a `DeviceRef` on or off without caring which variant they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRef {
    Single(DeviceId),
    Group { name: String, members: Vec<DeviceId> },
}

impl DeviceRef {
    /// Devices addressed by this reference.
    pub fn members(&self) -> &[DeviceId] {
        match self {
            Self::Single(id) => std::slice::from_ref(id),
            Self::Group { members, .. } => members,
        }
    }

    pub fn enable(&self, registry: &mut dyn DeviceRegistry) -> DeviceResult<()> {
        self.set_enabled(registry, true)
    }

    pub fn disable(&self, registry: &mut dyn DeviceRegistry) -> DeviceResult<()> {
        self.set_enabled(registry, false)
    }

    /// Every member is commanded even if an earlier one fails; the first
    /// failure is returned.
    fn set_enabled(&self, registry: &mut dyn DeviceRegistry, enabled: bool) -> DeviceResult<()> {
        let mut first_err = None;
        for id in self.members() {
            if let Err(e) = registry.apply(*id, DeviceCommand::SetEnabled(enabled)) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Resolves logical names to live devices and carries commands to them.
///
/// Reads are always fresh: implementations must not hand out values cached
/// from an earlier tick.
pub trait DeviceRegistry {
    /// Resolve a single device by its name.
    fn device(&self, name: &str) -> DeviceResult<DeviceId>;

    /// Resolve a named group to its member devices.
    fn group(&self, name: &str) -> DeviceResult<Vec<DeviceId>>;

    fn actuator(&self, id: DeviceId) -> DeviceResult<ActuatorReading>;

    fn rotary_joint(&self, id: DeviceId) -> DeviceResult<RotaryReading>;

    /// Designated inventory of a storage-bearing device.
    fn storage(&self, id: DeviceId) -> DeviceResult<StorageReading>;

    /// Every storage-bearing device known to the registry.
    fn storage_nodes(&self) -> Vec<StorageReading>;

    /// Whether material can travel between the two devices' inventories.
    fn is_connected(&self, a: DeviceId, b: DeviceId) -> bool;

    fn items(&self, id: DeviceId) -> DeviceResult<Vec<Item>>;

    /// Issue a command. A rejected transfer is reported as
    /// [`DeviceErrorKind::TransferRejected`](crate::DeviceErrorKind), never a panic.
    fn apply(&mut self, id: DeviceId, command: DeviceCommand) -> DeviceResult<()>;

    fn write_text(&mut self, display: DeviceId, text: &str, append: bool) -> DeviceResult<()>;

    /// Resolve a name as a single device first, then as a group.
    fn resolve(&self, name: &str) -> DeviceResult<DeviceRef> {
        match self.device(name) {
            Ok(id) => Ok(DeviceRef::Single(id)),
            Err(e) if e.is_not_found() => self.resolve_group(name),
            Err(e) => Err(e),
        }
    }

    fn resolve_group(&self, name: &str) -> DeviceResult<DeviceRef> {
        let members = self.group(name)?;
        Ok(DeviceRef::Group {
            name: name.to_string(),
            members,
        })
    }

    /// Read every member of a group that is an actuator, skipping the rest.
    fn actuators_in(&self, group: &str) -> DeviceResult<Vec<ActuatorReading>> {
        let members = self.group(group)?;
        Ok(members
            .into_iter()
            .filter_map(|id| self.actuator(id).ok())
            .collect())
    }

    /// Read every member of a group that carries an inventory, skipping the rest.
    fn storage_in(&self, group: &str) -> DeviceResult<Vec<StorageReading>> {
        let members = self.group(group)?;
        Ok(members
            .into_iter()
            .filter_map(|id| self.storage(id).ok())
            .collect())
    }
}

impl From<DeviceId> for DeviceRef {
    fn from(id: DeviceId) -> Self {
        Self::Single(id)
    }
}

/// Convenience for registries that need a uniform "unknown id" error.
pub fn unknown_device(id: DeviceId) -> DeviceError {
    DeviceError::not_found(id.to_string())
}
