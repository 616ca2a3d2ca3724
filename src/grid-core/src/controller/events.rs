// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Control event notification system.
//!
//! Hosts register listeners to observe controller decisions without parsing
//! telemetry text.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::device::response::DeviceError;
use crate::device::DeviceId;

use super::capacity::FillRatio;
use super::machine::RotationTarget;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Trait for components that want to receive control events.
///
/// All methods have default no-op implementations, so listeners can
/// selectively override only the events they care about.
pub trait ControlListener: Send + Sync {
    /// A required device could not be resolved; the pass was skipped.
    fn on_configuration_error(&self, _pass: &'static str, _entity: &str) {}

    /// Producers were switched according to the capacity check.
    fn on_backpressure(&self, _engaged: bool, _ratio: FillRatio) {}

    /// A half-turn completed and the awaited angle flipped.
    fn on_target_flip(&self, _old: RotationTarget, _new: RotationTarget) {}

    /// An actuator was commanded to raise its limit and extend.
    fn on_advance(&self, _actuator: DeviceId, _name: &str) {}

    /// Every actuator is fully extended.
    fn on_fully_extended(&self) {}

    fn on_transfer(&self, _from: DeviceId, _to: DeviceId, _item: &str, _amount: f64) {}

    fn on_transfer_failed(&self, _from: DeviceId, _to: DeviceId, _item: &str, _error: &DeviceError) {
    }
}

/// Manages registered listeners and dispatches events.
#[derive(Default)]
pub struct ControlEventEmitter {
    listeners: Vec<(ListenerId, Arc<dyn ControlListener>)>,
}

impl ControlEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener to receive events.
    /// Returns an ID that can be used to unregister the listener.
    pub fn register(&mut self, listener: Arc<dyn ControlListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, listener));
        id
    }

    pub fn unregister(&mut self, id: ListenerId) {
        self.listeners.retain(|(lid, _)| *lid != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn notify_configuration_error(&self, pass: &'static str, entity: &str) {
        for (_, listener) in &self.listeners {
            listener.on_configuration_error(pass, entity);
        }
    }

    pub fn notify_backpressure(&self, engaged: bool, ratio: FillRatio) {
        for (_, listener) in &self.listeners {
            listener.on_backpressure(engaged, ratio);
        }
    }

    pub fn notify_target_flip(&self, old: RotationTarget, new: RotationTarget) {
        for (_, listener) in &self.listeners {
            listener.on_target_flip(old, new);
        }
    }

    pub fn notify_advance(&self, actuator: DeviceId, name: &str) {
        for (_, listener) in &self.listeners {
            listener.on_advance(actuator, name);
        }
    }

    pub fn notify_fully_extended(&self) {
        for (_, listener) in &self.listeners {
            listener.on_fully_extended();
        }
    }

    pub fn notify_transfer(&self, from: DeviceId, to: DeviceId, item: &str, amount: f64) {
        for (_, listener) in &self.listeners {
            listener.on_transfer(from, to, item, amount);
        }
    }

    pub fn notify_transfer_failed(&self, from: DeviceId, to: DeviceId, item: &str, error: &DeviceError) {
        for (_, listener) in &self.listeners {
            listener.on_transfer_failed(from, to, item, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct TestListener {
        flipped: AtomicBool,
        advanced: AtomicBool,
    }

    impl TestListener {
        fn new() -> Self {
            Self {
                flipped: AtomicBool::new(false),
                advanced: AtomicBool::new(false),
            }
        }
    }

    impl ControlListener for TestListener {
        fn on_target_flip(&self, _old: RotationTarget, _new: RotationTarget) {
            self.flipped.store(true, Ordering::Relaxed);
        }

        fn on_advance(&self, _actuator: DeviceId, _name: &str) {
            self.advanced.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_register_and_notify() {
        let mut emitter = ControlEventEmitter::new();
        let listener = Arc::new(TestListener::new());
        let id = emitter.register(listener.clone());

        assert_eq!(emitter.listener_count(), 1);

        emitter.notify_target_flip(RotationTarget::Zero, RotationTarget::HalfTurn);
        assert!(listener.flipped.load(Ordering::Relaxed));
        assert!(!listener.advanced.load(Ordering::Relaxed));

        emitter.notify_advance(DeviceId(1), "Piston 1");
        assert!(listener.advanced.load(Ordering::Relaxed));

        emitter.unregister(id);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_multiple_listeners() {
        let mut emitter = ControlEventEmitter::new();
        let listener1 = Arc::new(TestListener::new());
        let listener2 = Arc::new(TestListener::new());

        emitter.register(listener1.clone());
        emitter.register(listener2.clone());

        emitter.notify_advance(DeviceId(4), "Piston 2");

        assert!(listener1.advanced.load(Ordering::Relaxed));
        assert!(listener2.advanced.load(Ordering::Relaxed));
    }
}
