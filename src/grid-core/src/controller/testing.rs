// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Minimal in-memory registry for controller tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::device::command::DeviceCommand;
use crate::device::response::{DeviceError, DeviceResult};
use crate::device::state::{ActuatorReading, Item, RotaryReading, StorageReading};
use crate::device::{DeviceId, DeviceRegistry};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
enum FakeKind {
    Actuator { position: f64, limit: f64, max: f64 },
    Rotor { angle: f64 },
    Plain,
    Storage { current: f64, max: f64, network: u32, items: Vec<Item> },
}

#[derive(Debug, Clone)]
struct FakeDevice {
    name: String,
    kind: FakeKind,
}

#[derive(Debug, Default)]
pub struct FakeGrid {
    devices: BTreeMap<DeviceId, FakeDevice>,
    groups: HashMap<String, Vec<DeviceId>>,
    next_id: u64,
    rejecting: HashSet<DeviceId>,
    pub commands: Vec<(DeviceId, DeviceCommand)>,
    pub enabled: HashMap<DeviceId, bool>,
    pub texts: HashMap<DeviceId, String>,
}

impl FakeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, name: &str, kind: FakeKind) -> DeviceId {
        self.next_id += 1;
        let id = DeviceId(self.next_id);
        self.devices.insert(
            id,
            FakeDevice {
                name: name.to_string(),
                kind,
            },
        );
        id
    }

    pub fn add_actuator(&mut self, name: &str, position: f64, limit: f64, max: f64) -> DeviceId {
        self.add(
            name,
            FakeKind::Actuator {
                position,
                limit,
                max,
            },
        )
    }

    pub fn add_rotor(&mut self, name: &str, angle: f64) -> DeviceId {
        self.add(name, FakeKind::Rotor { angle })
    }

    pub fn add_plain(&mut self, name: &str) -> DeviceId {
        self.add(name, FakeKind::Plain)
    }

    pub fn add_storage(&mut self, name: &str, current: f64, max: f64, network: u32) -> DeviceId {
        self.add(
            name,
            FakeKind::Storage {
                current,
                max,
                network,
                items: Vec::new(),
            },
        )
    }

    pub fn set_items(&mut self, id: DeviceId, items: Vec<Item>) {
        if let Some(FakeDevice {
            kind: FakeKind::Storage { items: slot, .. },
            ..
        }) = self.devices.get_mut(&id)
        {
            *slot = items;
        }
    }

    pub fn add_group(&mut self, name: &str, members: &[DeviceId]) {
        self.groups.insert(name.to_string(), members.to_vec());
    }

    pub fn reject_transfers_to(&mut self, id: DeviceId) {
        self.rejecting.insert(id);
    }

    pub fn commands_for(&self, id: DeviceId) -> Vec<DeviceCommand> {
        self.commands
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, cmd)| cmd.clone())
            .collect()
    }

    pub fn is_enabled(&self, id: DeviceId) -> Option<bool> {
        self.enabled.get(&id).copied()
    }

    fn transfer(&mut self, from: DeviceId, to: DeviceId, kind: &str, amount: f64) -> DeviceResult<()> {
        if self.rejecting.contains(&to) {
            return Err(DeviceError::transfer_rejected(format!("{} refuses {}", to, kind)));
        }
        let dest_free = match self.storage(to) {
            Ok(s) => s.free_volume(),
            Err(e) => return Err(e),
        };
        if amount > dest_free + EPSILON {
            return Err(DeviceError::transfer_rejected("not enough room"));
        }
        if let Some(FakeDevice {
            kind: FakeKind::Storage { current, items, .. },
            ..
        }) = self.devices.get_mut(&from)
        {
            let stack = items
                .iter_mut()
                .find(|i| i.kind == kind)
                .ok_or_else(|| DeviceError::transfer_rejected("item not present"))?;
            if stack.amount + EPSILON < amount {
                return Err(DeviceError::transfer_rejected("not enough items"));
            }
            stack.amount -= amount;
            *current -= amount;
        } else {
            return Err(DeviceError::not_found(from.to_string()));
        }
        if let Some(FakeDevice {
            kind: FakeKind::Storage { current, items, .. },
            ..
        }) = self.devices.get_mut(&to)
        {
            *current += amount;
            match items.iter_mut().find(|i| i.kind == kind) {
                Some(stack) => stack.amount += amount,
                None => items.push(Item::new(kind, amount)),
            }
        }
        Ok(())
    }
}

impl DeviceRegistry for FakeGrid {
    fn device(&self, name: &str) -> DeviceResult<DeviceId> {
        self.devices
            .iter()
            .find(|(_, d)| d.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| DeviceError::not_found(name))
    }

    fn group(&self, name: &str) -> DeviceResult<Vec<DeviceId>> {
        self.groups
            .get(name)
            .cloned()
            .ok_or_else(|| DeviceError::not_found(name))
    }

    fn actuator(&self, id: DeviceId) -> DeviceResult<ActuatorReading> {
        match self.devices.get(&id) {
            Some(FakeDevice {
                name,
                kind:
                    FakeKind::Actuator {
                        position,
                        limit,
                        max,
                    },
            }) => Ok(ActuatorReading {
                id,
                name: name.clone(),
                position: *position,
                limit: *limit,
                max: *max,
            }),
            _ => Err(DeviceError::not_found(id.to_string())),
        }
    }

    fn rotary_joint(&self, id: DeviceId) -> DeviceResult<RotaryReading> {
        match self.devices.get(&id) {
            Some(FakeDevice {
                name,
                kind: FakeKind::Rotor { angle },
            }) => Ok(RotaryReading {
                id,
                name: name.clone(),
                angle: *angle,
            }),
            _ => Err(DeviceError::not_found(id.to_string())),
        }
    }

    fn storage(&self, id: DeviceId) -> DeviceResult<StorageReading> {
        match self.devices.get(&id) {
            Some(FakeDevice {
                name,
                kind: FakeKind::Storage { current, max, .. },
            }) => Ok(StorageReading {
                id,
                name: name.clone(),
                current_volume: *current,
                max_volume: *max,
            }),
            _ => Err(DeviceError::not_found(id.to_string())),
        }
    }

    fn storage_nodes(&self) -> Vec<StorageReading> {
        self.devices
            .keys()
            .filter_map(|id| self.storage(*id).ok())
            .collect()
    }

    fn is_connected(&self, a: DeviceId, b: DeviceId) -> bool {
        let network = |id: DeviceId| match self.devices.get(&id) {
            Some(FakeDevice {
                kind: FakeKind::Storage { network, .. },
                ..
            }) => Some(*network),
            _ => None,
        };
        matches!((network(a), network(b)), (Some(x), Some(y)) if x == y)
    }

    fn items(&self, id: DeviceId) -> DeviceResult<Vec<Item>> {
        match self.devices.get(&id) {
            Some(FakeDevice {
                kind: FakeKind::Storage { items, .. },
                ..
            }) => Ok(items.clone()),
            _ => Err(DeviceError::not_found(id.to_string())),
        }
    }

    fn apply(&mut self, id: DeviceId, command: DeviceCommand) -> DeviceResult<()> {
        if !self.devices.contains_key(&id) {
            return Err(DeviceError::not_found(id.to_string()));
        }
        self.commands.push((id, command.clone()));
        match command {
            DeviceCommand::SetEnabled(on) => {
                self.enabled.insert(id, on);
                Ok(())
            }
            DeviceCommand::Extend => Ok(()),
            DeviceCommand::RaiseLimit => match self.devices.get_mut(&id) {
                Some(FakeDevice {
                    kind: FakeKind::Actuator { limit, max, .. },
                    ..
                }) => {
                    *limit = (*limit + 1.0).min(*max);
                    Ok(())
                }
                _ => Err(DeviceError::unsupported("RaiseLimit")),
            },
            DeviceCommand::TransferItem { to, item, amount } => self.transfer(id, to, &item, amount),
        }
    }

    fn write_text(&mut self, display: DeviceId, text: &str, append: bool) -> DeviceResult<()> {
        if !self.devices.contains_key(&display) {
            return Err(DeviceError::not_found(display.to_string()));
        }
        let slot = self.texts.entry(display).or_default();
        if !append {
            slot.clear();
        }
        slot.push_str(text);
        Ok(())
    }
}
