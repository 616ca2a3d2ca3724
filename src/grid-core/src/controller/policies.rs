// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Actuator selection policies.
//!
//! Actuators are extended one at a time, in the order given by a key
//! extracted from their names. An actuator stops being a candidate once the
//! configured [`ExtensionPolicy`] considers it fully extended.

use regex::Regex;
use thiserror::Error;

use crate::device::state::ActuatorReading;

/// Decides when an actuator has nothing left to give.
pub trait ExtensionPolicy: Send + Sync {
    fn is_fully_extended(&self, actuator: &ActuatorReading) -> bool;

    fn name(&self) -> &'static str;
}

/// Fully extended once the travel limit has been raised to the maximum.
///
/// An actuator that is still travelling towards its raised limit is not a
/// candidate any more, so the next one is picked on the following half-turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitReached;

impl ExtensionPolicy for LimitReached {
    fn is_fully_extended(&self, actuator: &ActuatorReading) -> bool {
        actuator.limit >= actuator.max
    }

    fn name(&self) -> &'static str {
        "limit"
    }
}

/// Fully extended once the actuator has physically reached its maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionReached;

impl ExtensionPolicy for PositionReached {
    fn is_fully_extended(&self, actuator: &ActuatorReading) -> bool {
        actuator.position >= actuator.max
    }

    fn name(&self) -> &'static str {
        "position"
    }
}

#[derive(Debug, Error)]
pub enum OrderingKeyError {
    #[error("invalid index pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("index pattern {0:?} has no named group `index`")]
    MissingIndexGroup(String),
}

/// Extracts an ordering key from an actuator name.
///
/// The pattern must expose a named group `index` holding decimal digits.
/// Names that do not match, or whose index does not fit, get key 0.
#[derive(Debug, Clone)]
pub struct OrderingKey {
    pattern: Regex,
}

impl OrderingKey {
    /// Trailing integer, e.g. `"Piston 12"` -> 12.
    pub const DEFAULT_PATTERN: &'static str = r"^.*?(?P<index>\d+)$";

    pub fn new(pattern: &str) -> Result<Self, OrderingKeyError> {
        let pattern = Regex::new(pattern)?;
        if !pattern.capture_names().any(|n| n == Some("index")) {
            return Err(OrderingKeyError::MissingIndexGroup(
                pattern.as_str().to_string(),
            ));
        }
        Ok(Self { pattern })
    }

    pub fn key(&self, name: &str) -> u64 {
        self.pattern
            .captures(name)
            .and_then(|caps| caps.name("index"))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }
}

impl Default for OrderingKey {
    fn default() -> Self {
        Self {
            pattern: Regex::new(Self::DEFAULT_PATTERN).expect("default index pattern is valid"),
        }
    }
}

/// Pick the actuator to advance: the smallest key among those not fully extended.
///
/// Equal keys keep registry order. Returns `None` when every actuator is
/// fully extended.
pub fn select_current_actuator<'a>(
    actuators: &'a [ActuatorReading],
    policy: &dyn ExtensionPolicy,
    ordering: &OrderingKey,
) -> Option<&'a ActuatorReading> {
    actuators
        .iter()
        .filter(|a| !policy.is_fully_extended(a))
        .min_by_key(|a| ordering.key(&a.name))
}
