// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Rotation state machine for the drill head.
//!
//! The drill advances once per completed half-turn of its rotary joint. The
//! only state that survives between ticks is which half of the turn is
//! being awaited; it is owned by the caller and threaded through every
//! [`DrillController::step`](super::DrillController::step).
//!
//! This is a free-running oscillator, not an angle tracker: there is no slip
//! detection, and a stalled joint simply never completes a half-turn.

use std::f64::consts::PI;
use std::fmt;

/// Angle the drill is waiting for the rotary joint to reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationTarget {
    /// Awaiting 0 rad.
    #[default]
    Zero,
    /// Awaiting π rad.
    HalfTurn,
}

impl RotationTarget {
    /// Target angle in radians.
    pub fn angle(self) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::HalfTurn => PI,
        }
    }

    /// The other half of the cycle.
    pub fn flipped(self) -> Self {
        match self {
            Self::Zero => Self::HalfTurn,
            Self::HalfTurn => Self::Zero,
        }
    }
}

impl fmt::Display for RotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "0"),
            Self::HalfTurn => write!(f, "π"),
        }
    }
}

/// Whether `angle` lies in the half-open window `[target - threshold, target + threshold)`.
pub fn is_rotation_complete(angle: f64, target: f64, threshold: f64) -> bool {
    angle >= target - threshold && angle < target + threshold
}

/// Persisted rotation state, carried from one tick to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationState {
    next_target: RotationTarget,
}

impl RotationState {
    /// Fresh state awaiting 0 rad.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn awaiting(target: RotationTarget) -> Self {
        Self {
            next_target: target,
        }
    }

    pub fn next_target(&self) -> RotationTarget {
        self.next_target
    }

    /// Feed the current joint angle.
    ///
    /// Returns the next state and whether a half-turn completed. On
    /// completion the awaited target flips exactly once.
    pub fn observe(self, angle: f64, threshold: f64) -> (Self, bool) {
        if is_rotation_complete(angle, self.next_target.angle(), threshold) {
            (
                Self {
                    next_target: self.next_target.flipped(),
                },
                true,
            )
        } else {
            (self, false)
        }
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "awaiting {}", self.next_target)
    }
}
