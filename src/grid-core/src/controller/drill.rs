// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Drill advancement controller.
//!
//! Every tick the controller reads the rig fresh from the registry, picks the
//! actuator to advance, gates the producers on downstream capacity and,
//! whenever the rotary joint completes a half-turn, raises the current
//! actuator's limit by one step.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::command::DeviceCommand;
use crate::device::state::{ActuatorReading, RotaryReading, StorageReading};
use crate::device::{DeviceId, DeviceRef, DeviceRegistry};
use crate::telemetry::{publish_to, TextSurface};

use super::capacity::{CapacityMonitor, CapacityReport};
use super::config::DrillConfig;
use super::events::{ControlEventEmitter, ControlListener, ListenerId};
use super::machine::RotationState;
use super::policies::{select_current_actuator, ExtensionPolicy, OrderingKey, OrderingKeyError};

const PASS: &str = "drill";

/// What a drill step decided.
#[derive(Debug, Clone, PartialEq)]
pub enum DrillOutcome {
    /// A required device is missing; nothing was commanded.
    ConfigurationError { entity: String },
    /// No actuator left to extend; producers were left untouched.
    FullyExtended,
    /// The joint has not reached the awaited angle yet.
    Waiting { actuator: DeviceId },
    /// A half-turn completed and `actuator` was advanced.
    Advanced { actuator: DeviceId },
}

/// Output of [`DrillController::step`].
#[derive(Debug, Clone)]
pub struct DrillReport {
    /// Rotation state to feed into the next step.
    pub state: RotationState,
    pub outcome: DrillOutcome,
    pub capacity: Option<CapacityReport>,
    /// Producer switch state commanded this tick, if any.
    pub producers_enabled: Option<bool>,
    /// Status text, also published to the display.
    pub lines: Vec<String>,
}

/// Devices resolved at the start of a step, before any command is issued.
struct DrillDevices {
    actuators: Vec<ActuatorReading>,
    rig: DeviceRef,
    rotor: RotaryReading,
    indicator: DeviceRef,
    reference: StorageReading,
}

pub struct DrillController {
    config: DrillConfig,
    extension: Box<dyn ExtensionPolicy>,
    ordering: OrderingKey,
    emitter: ControlEventEmitter,
}

impl DrillController {
    pub fn new(config: DrillConfig) -> Result<Self, OrderingKeyError> {
        let ordering = OrderingKey::new(&config.index_pattern)?;
        Ok(Self {
            extension: config.extension_check.policy(),
            ordering,
            config,
            emitter: ControlEventEmitter::new(),
        })
    }

    pub fn register(&mut self, listener: Arc<dyn ControlListener>) -> ListenerId {
        self.emitter.register(listener)
    }

    /// Run one tick.
    ///
    /// Status goes to the configured display, or to `fallback` when the
    /// display cannot be resolved. The returned state must be passed to the
    /// next call.
    pub fn step(
        &self,
        registry: &mut dyn DeviceRegistry,
        fallback: &mut dyn TextSurface,
        state: RotationState,
    ) -> DrillReport {
        let display = self
            .config
            .display
            .as_deref()
            .and_then(|name| registry.device(name).ok());

        let devices = match self.resolve(registry) {
            Ok(devices) => devices,
            Err(entity) => {
                warn!("Drill configuration error: {} not found", entity);
                self.emitter.notify_configuration_error(PASS, &entity);
                let lines = vec![format!("[CFG ERR]: entity not found: {}", entity)];
                publish_to(registry, display, fallback, &lines);
                return DrillReport {
                    state,
                    outcome: DrillOutcome::ConfigurationError { entity },
                    capacity: None,
                    producers_enabled: None,
                    lines,
                };
            }
        };

        switch(registry, &devices.indicator, false);

        let Some(current) = select_current_actuator(
            &devices.actuators,
            self.extension.as_ref(),
            &self.ordering,
        ) else {
            info!("All actuators are fully extended");
            switch(registry, &devices.indicator, true);
            self.emitter.notify_fully_extended();
            let mut lines = vec!["All actuators are fully extended.".to_string(), String::new()];
            lines.extend(self.actuator_lines(&devices.actuators, None));
            publish_to(registry, display, fallback, &lines);
            return DrillReport {
                state,
                outcome: DrillOutcome::FullyExtended,
                capacity: None,
                producers_enabled: None,
                lines,
            };
        };
        let current = current.clone();

        let capacity = CapacityMonitor::compute_fill_ratio(&*registry, devices.reference.id);
        let backpressure = capacity.ratio.exceeds(self.config.fill_threshold);
        if backpressure {
            debug!(
                "Storage at {} exceeds {:.0}%, stopping producers",
                capacity.ratio,
                self.config.fill_threshold * 100.0
            );
        }
        switch(registry, &devices.rig, !backpressure);
        switch(registry, &DeviceRef::from(devices.rotor.id), !backpressure);
        self.emitter.notify_backpressure(backpressure, capacity.ratio);

        let (next_state, completed) = state.observe(devices.rotor.angle, self.config.angle_threshold);
        let outcome = if completed {
            info!(
                "Half-turn complete at {:.3} rad, advancing {}",
                devices.rotor.angle, current.name
            );
            self.emitter
                .notify_target_flip(state.next_target(), next_state.next_target());
            switch(registry, &devices.indicator, true);
            command(registry, current.id, DeviceCommand::RaiseLimit);
            command(registry, current.id, DeviceCommand::Extend);
            self.emitter.notify_advance(current.id, &current.name);
            DrillOutcome::Advanced {
                actuator: current.id,
            }
        } else {
            DrillOutcome::Waiting {
                actuator: current.id,
            }
        };

        let lines = self.status_lines(&devices, &current, &capacity, backpressure, next_state);
        publish_to(registry, display, fallback, &lines);

        DrillReport {
            state: next_state,
            outcome,
            capacity: Some(capacity),
            producers_enabled: Some(!backpressure),
            lines,
        }
    }

    /// Resolve every required device. Returns the missing entity on failure.
    fn resolve(&self, registry: &dyn DeviceRegistry) -> Result<DrillDevices, String> {
        let cfg = &self.config;
        let actuators = registry
            .actuators_in(&cfg.actuator_group)
            .map_err(|_| format!("actuator group '{}'", cfg.actuator_group))?;
        let rig = registry
            .resolve_group(&cfg.rig_group)
            .map_err(|_| format!("rig group '{}'", cfg.rig_group))?;
        let rotor = registry
            .device(&cfg.rotary_joint)
            .and_then(|id| registry.rotary_joint(id))
            .map_err(|_| format!("rotary joint '{}'", cfg.rotary_joint))?;
        let indicator = registry
            .resolve(&cfg.indicator)
            .map_err(|_| format!("indicator '{}'", cfg.indicator))?;
        let reference = rig
            .members()
            .first()
            .and_then(|id| registry.storage(*id).ok())
            .ok_or_else(|| format!("reference inventory in rig group '{}'", cfg.rig_group))?;

        debug!(
            "Resolved {} actuators, {} rig members",
            actuators.len(),
            rig.members().len()
        );
        Ok(DrillDevices {
            actuators,
            rig,
            rotor,
            indicator,
            reference,
        })
    }

    fn status_lines(
        &self,
        devices: &DrillDevices,
        current: &ActuatorReading,
        capacity: &CapacityReport,
        backpressure: bool,
        state: RotationState,
    ) -> Vec<String> {
        let mut lines = vec![format!("current angle: {:.3}", devices.rotor.angle)];
        if capacity.ratio.is_measured() {
            lines.push(format!("station capacity at {}", capacity.ratio));
        } else {
            lines.push("station capacity: no reachable capacity".to_string());
        }
        lines.push(format!("rotation: {}", state));
        lines.push(format!(
            "producers: {}",
            if backpressure { "stopped (storage full)" } else { "running" }
        ));
        lines.push(String::new());
        lines.extend(self.actuator_lines(&devices.actuators, Some(current.id)));
        lines.push(String::new());

        let not_extended = devices
            .actuators
            .iter()
            .filter(|a| !self.extension.is_fully_extended(a))
            .count();
        lines.push(format!(
            "actuators: {} ({} not extended)",
            devices.actuators.len(),
            not_extended
        ));
        lines.push(format!("rig members: {}", devices.rig.members().len()));
        lines.push(format!("reference inventory: {}", devices.reference.name));
        lines.push(format!("connected inventories: {}", capacity.nodes));
        lines
    }

    fn actuator_lines(&self, actuators: &[ActuatorReading], current: Option<DeviceId>) -> Vec<String> {
        let mut sorted: Vec<&ActuatorReading> = actuators.iter().collect();
        sorted.sort_by_key(|a| self.ordering.key(&a.name));
        sorted
            .into_iter()
            .map(|a| {
                let flag = if Some(a.id) == current { "> " } else { "" };
                format!(
                    "{}{} at {:.2} / {:.2} | {:.2}",
                    flag, a.name, a.position, a.limit, a.max
                )
            })
            .collect()
    }
}

fn switch(registry: &mut dyn DeviceRegistry, target: &DeviceRef, on: bool) {
    let result = if on {
        target.enable(registry)
    } else {
        target.disable(registry)
    };
    if let Err(e) = result {
        warn!("Failed to switch {:?} {}: {}", target, if on { "on" } else { "off" }, e);
    }
}

fn command(registry: &mut dyn DeviceRegistry, id: DeviceId, cmd: DeviceCommand) {
    let name = cmd.name();
    if let Err(e) = registry.apply(id, cmd) {
        warn!("{} on {} failed: {}", name, id, e);
    }
}
