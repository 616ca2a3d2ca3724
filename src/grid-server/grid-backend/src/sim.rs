// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Simulated grid for development and testing.
//!
//! Holds every block in memory and applies commands immediately. `advance`
//! runs one frame of very rough physics so controllers have something to
//! react to: rotors spin, pistons travel toward their limit, drills mine
//! into their own inventory and push it along the conveyor network, and
//! assemblers fill their output buffers.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use tracing::{debug, trace};

use grid_core::device::unknown_device;
use grid_core::{
    ActuatorReading, DeviceCommand, DeviceError, DeviceId, DeviceRegistry, DeviceResult, Item,
    RotaryReading, StorageReading,
};

const EPSILON: f64 = 1e-9;
/// How far one `RaiseLimit` moves a piston's upper limit.
pub const DEFAULT_LIMIT_STEP: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub max_volume: f64,
    /// Conveyor network id; inventories on the same network are connected.
    pub network: u32,
    pub items: Vec<Item>,
    /// Item kinds this inventory takes; `None` takes anything.
    pub accepts: Option<Vec<String>>,
}

impl Inventory {
    pub fn new(max_volume: f64, network: u32) -> Self {
        Self {
            max_volume,
            network,
            items: Vec::new(),
            accepts: None,
        }
    }

    pub fn volume(&self) -> f64 {
        self.items.iter().map(|i| i.amount).sum()
    }

    pub fn free_volume(&self) -> f64 {
        (self.max_volume - self.volume()).max(0.0)
    }

    pub fn amount_of(&self, kind: &str) -> f64 {
        self.items
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.amount)
            .sum()
    }

    pub fn accepts(&self, kind: &str) -> bool {
        match &self.accepts {
            Some(kinds) => kinds.iter().any(|k| k == kind),
            None => true,
        }
    }

    fn insert(&mut self, kind: &str, amount: f64) {
        match self.items.iter_mut().find(|i| i.kind == kind) {
            Some(stack) => stack.amount += amount,
            None => self.items.push(Item::new(kind, amount)),
        }
    }

    fn take(&mut self, kind: &str, amount: f64) {
        if let Some(stack) = self.items.iter_mut().find(|i| i.kind == kind) {
            stack.amount -= amount;
        }
        self.items.retain(|i| i.amount > EPSILON);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Piston {
        position: f64,
        limit: f64,
        max: f64,
        speed: f64,
        extending: bool,
    },
    Rotor {
        angle: f64,
        speed: f64,
    },
    Light,
    Display,
    Drill {
        ore: String,
        rate: f64,
    },
    Assembler {
        product: String,
        rate: f64,
    },
    Cargo,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub enabled: bool,
    pub kind: BlockKind,
    pub inventory: Option<Inventory>,
}

pub struct SimGrid {
    blocks: BTreeMap<DeviceId, Block>,
    groups: HashMap<String, Vec<DeviceId>>,
    texts: HashMap<DeviceId, String>,
    next_id: u64,
    limit_step: f64,
    frame: u64,
}

impl SimGrid {
    pub fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
            groups: HashMap::new(),
            texts: HashMap::new(),
            next_id: 0,
            limit_step: DEFAULT_LIMIT_STEP,
            frame: 0,
        }
    }

    pub fn with_limit_step(mut self, step: f64) -> Self {
        self.limit_step = step;
        self
    }

    fn add(&mut self, name: &str, kind: BlockKind, inventory: Option<Inventory>) -> DeviceId {
        self.next_id += 1;
        let id = DeviceId(self.next_id);
        self.blocks.insert(
            id,
            Block {
                name: name.to_string(),
                enabled: true,
                kind,
                inventory,
            },
        );
        id
    }

    pub fn add_piston(&mut self, name: &str, position: f64, limit: f64, max: f64, speed: f64) -> DeviceId {
        self.add(
            name,
            BlockKind::Piston {
                position,
                limit,
                max,
                speed,
                extending: false,
            },
            None,
        )
    }

    pub fn add_rotor(&mut self, name: &str, angle: f64, speed: f64) -> DeviceId {
        self.add(name, BlockKind::Rotor { angle, speed }, None)
    }

    pub fn add_light(&mut self, name: &str) -> DeviceId {
        self.add(name, BlockKind::Light, None)
    }

    pub fn add_display(&mut self, name: &str) -> DeviceId {
        self.add(name, BlockKind::Display, None)
    }

    pub fn add_drill(&mut self, name: &str, ore: &str, rate: f64, capacity: f64, network: u32) -> DeviceId {
        self.add(
            name,
            BlockKind::Drill {
                ore: ore.to_string(),
                rate,
            },
            Some(Inventory::new(capacity, network)),
        )
    }

    pub fn add_assembler(
        &mut self,
        name: &str,
        product: &str,
        rate: f64,
        capacity: f64,
        network: u32,
    ) -> DeviceId {
        self.add(
            name,
            BlockKind::Assembler {
                product: product.to_string(),
                rate,
            },
            Some(Inventory::new(capacity, network)),
        )
    }

    pub fn add_cargo(&mut self, name: &str, capacity: f64, network: u32) -> DeviceId {
        self.add(name, BlockKind::Cargo, Some(Inventory::new(capacity, network)))
    }

    pub fn add_group(&mut self, name: &str, members: &[DeviceId]) {
        self.groups.insert(name.to_string(), members.to_vec());
    }

    /// Cargo container that only takes the given item kinds.
    pub fn add_filtered_cargo(
        &mut self,
        name: &str,
        capacity: f64,
        network: u32,
        kinds: &[&str],
    ) -> DeviceId {
        let inventory = Inventory {
            accepts: Some(kinds.iter().map(|k| k.to_string()).collect()),
            ..Inventory::new(capacity, network)
        };
        self.add(name, BlockKind::Cargo, Some(inventory))
    }

    /// Put items straight into an inventory, bypassing the conveyors.
    pub fn fill(&mut self, id: DeviceId, kind: &str, amount: f64) -> DeviceResult<()> {
        let inventory = self.inventory_mut(id)?;
        if amount > inventory.free_volume() + EPSILON {
            return Err(DeviceError::invalid_state(format!(
                "{} has room for {:.2}, not {:.2}",
                id,
                inventory.free_volume(),
                amount
            )));
        }
        inventory.insert(kind, amount);
        Ok(())
    }

    pub fn block(&self, id: DeviceId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn text(&self, id: DeviceId) -> Option<&str> {
        self.texts.get(&id).map(String::as_str)
    }

    pub fn is_enabled(&self, id: DeviceId) -> bool {
        self.blocks.get(&id).is_some_and(|b| b.enabled)
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame of physics.
    pub fn advance(&mut self) {
        self.frame += 1;
        let mut mined = Vec::new();

        for (id, block) in self.blocks.iter_mut() {
            if !block.enabled {
                continue;
            }
            match &mut block.kind {
                BlockKind::Rotor { angle, speed } => {
                    *angle = (*angle + *speed).rem_euclid(TAU);
                }
                BlockKind::Piston {
                    position,
                    limit,
                    speed,
                    extending,
                    ..
                } => {
                    if *extending && *position < *limit {
                        *position = (*position + *speed).min(*limit);
                    }
                }
                BlockKind::Drill { ore, rate } => {
                    if let Some(inventory) = block.inventory.as_mut() {
                        let amount = rate.min(inventory.free_volume());
                        if amount > 0.0 {
                            inventory.insert(ore, amount);
                        }
                    }
                    mined.push(*id);
                }
                BlockKind::Assembler { product, rate } => {
                    if let Some(inventory) = block.inventory.as_mut() {
                        let amount = rate.min(inventory.free_volume());
                        if amount > 0.0 {
                            inventory.insert(product, amount);
                        }
                    }
                }
                BlockKind::Light | BlockKind::Display | BlockKind::Cargo => {}
            }
        }

        for id in mined {
            self.push_to_cargo(id);
        }
        trace!("Advanced simulation to frame {}", self.frame);
    }

    /// Empty `source` into connected cargo containers, in id order.
    fn push_to_cargo(&mut self, source: DeviceId) {
        let Ok(network) = self.inventory(source).map(|i| i.network) else {
            return;
        };
        let targets: Vec<DeviceId> = self
            .blocks
            .iter()
            .filter(|(id, b)| {
                **id != source
                    && b.kind == BlockKind::Cargo
                    && b.inventory.as_ref().is_some_and(|i| i.network == network)
            })
            .map(|(id, _)| *id)
            .collect();
        let items = self
            .inventory(source)
            .map(|i| i.items.clone())
            .unwrap_or_default();

        for item in items {
            let mut left = item.amount;
            for target in &targets {
                if left <= EPSILON {
                    break;
                }
                let room = match self.inventory(*target) {
                    Ok(inv) if inv.accepts(&item.kind) => inv.free_volume(),
                    _ => continue,
                };
                let amount = left.min(room);
                if amount > EPSILON && self.move_items(source, *target, &item.kind, amount).is_ok() {
                    left -= amount;
                }
            }
        }
    }

    fn inventory(&self, id: DeviceId) -> DeviceResult<&Inventory> {
        let block = self.blocks.get(&id).ok_or_else(|| unknown_device(id))?;
        block
            .inventory
            .as_ref()
            .ok_or_else(|| DeviceError::not_found(format!("{} has no inventory", block.name)))
    }

    fn inventory_mut(&mut self, id: DeviceId) -> DeviceResult<&mut Inventory> {
        let block = self.blocks.get_mut(&id).ok_or_else(|| unknown_device(id))?;
        let name = block.name.clone();
        block
            .inventory
            .as_mut()
            .ok_or_else(|| DeviceError::not_found(format!("{} has no inventory", name)))
    }

    fn name_of(&self, id: DeviceId) -> String {
        self.blocks
            .get(&id)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn move_items(&mut self, from: DeviceId, to: DeviceId, kind: &str, amount: f64) -> DeviceResult<()> {
        if from == to {
            return Err(DeviceError::invalid_state("source and destination are the same inventory"));
        }
        if amount <= 0.0 {
            return Err(DeviceError::invalid_state(format!("cannot move {:.2} items", amount)));
        }
        let source = self.inventory(from)?;
        let dest = self.inventory(to)?;
        if source.network != dest.network {
            return Err(DeviceError::transfer_rejected(format!(
                "{} is not connected to {}",
                self.name_of(to),
                self.name_of(from)
            )));
        }
        if !dest.accepts(kind) {
            return Err(DeviceError::transfer_rejected(format!(
                "{} does not accept {}",
                self.name_of(to),
                kind
            )));
        }
        if amount > dest.free_volume() + EPSILON {
            return Err(DeviceError::transfer_rejected(format!(
                "{} has room for {:.2}, not {:.2}",
                self.name_of(to),
                dest.free_volume(),
                amount
            )));
        }
        if source.amount_of(kind) + EPSILON < amount {
            return Err(DeviceError::transfer_rejected(format!(
                "{} holds only {:.2} {}",
                self.name_of(from),
                source.amount_of(kind),
                kind
            )));
        }

        self.inventory_mut(from)?.take(kind, amount);
        self.inventory_mut(to)?.insert(kind, amount);
        debug!("Moved {:.2} {} from {} to {}", amount, kind, from, to);
        Ok(())
    }
}

impl Default for SimGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for SimGrid {
    fn device(&self, name: &str) -> DeviceResult<DeviceId> {
        self.blocks
            .iter()
            .find(|(_, b)| b.name == name)
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
        let block = self.blocks.get(&id).ok_or_else(|| unknown_device(id))?;
        match block.kind {
            BlockKind::Piston {
                position,
                limit,
                max,
                ..
            } => Ok(ActuatorReading {
                id,
                name: block.name.clone(),
                position,
                limit,
                max,
            }),
            _ => Err(DeviceError::not_found(format!("{} is not a piston", block.name))),
        }
    }

    fn rotary_joint(&self, id: DeviceId) -> DeviceResult<RotaryReading> {
        let block = self.blocks.get(&id).ok_or_else(|| unknown_device(id))?;
        match block.kind {
            BlockKind::Rotor { angle, .. } => Ok(RotaryReading {
                id,
                name: block.name.clone(),
                angle,
            }),
            _ => Err(DeviceError::not_found(format!("{} is not a rotor", block.name))),
        }
    }

    fn storage(&self, id: DeviceId) -> DeviceResult<StorageReading> {
        let inventory = self.inventory(id)?;
        Ok(StorageReading {
            id,
            name: self.name_of(id),
            current_volume: inventory.volume(),
            max_volume: inventory.max_volume,
        })
    }

    fn storage_nodes(&self) -> Vec<StorageReading> {
        self.blocks
            .keys()
            .filter_map(|id| self.storage(*id).ok())
            .collect()
    }

    fn is_connected(&self, a: DeviceId, b: DeviceId) -> bool {
        match (self.inventory(a), self.inventory(b)) {
            (Ok(x), Ok(y)) => x.network == y.network,
            _ => false,
        }
    }

    fn items(&self, id: DeviceId) -> DeviceResult<Vec<Item>> {
        Ok(self.inventory(id)?.items.clone())
    }

    fn apply(&mut self, id: DeviceId, command: DeviceCommand) -> DeviceResult<()> {
        let limit_step = self.limit_step;
        let block = self.blocks.get_mut(&id).ok_or_else(|| unknown_device(id))?;
        match command {
            DeviceCommand::SetEnabled(on) => {
                block.enabled = on;
                Ok(())
            }
            DeviceCommand::Extend => match &mut block.kind {
                BlockKind::Piston { extending, .. } => {
                    *extending = true;
                    Ok(())
                }
                _ => Err(DeviceError::unsupported("Extend")),
            },
            DeviceCommand::RaiseLimit => match &mut block.kind {
                BlockKind::Piston { limit, max, .. } => {
                    *limit = (*limit + limit_step).min(*max);
                    Ok(())
                }
                _ => Err(DeviceError::unsupported("RaiseLimit")),
            },
            DeviceCommand::TransferItem { to, item, amount } => self.move_items(id, to, &item, amount),
        }
    }

    fn write_text(&mut self, display: DeviceId, text: &str, append: bool) -> DeviceResult<()> {
        let block = self.blocks.get(&display).ok_or_else(|| unknown_device(display))?;
        if block.kind != BlockKind::Display {
            return Err(DeviceError::unsupported("write_text"));
        }
        let slot = self.texts.entry(display).or_default();
        if !append {
            slot.clear();
        }
        slot.push_str(text);
        Ok(())
    }
}
