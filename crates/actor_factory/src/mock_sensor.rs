//! Mock collision sensor
//!
//! Implements `CollisionSensor` trait. Events are injected by the test
//! (or by `MockSimClient::trigger_collision`) instead of being produced by an engine.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{ActorId, CollisionCallback, CollisionEvent, CollisionSensor};
use tracing::{debug, trace};

/// 传感器共享状态
///
/// 回调槽与 listening 标志放在同一把锁后面：`stop()` 返回后不会再有回调执行。
#[derive(Default)]
struct Shared {
    listening: AtomicBool,
    callback: Mutex<Option<CollisionCallback>>,
    delivered: AtomicU64,
}

/// Mock collision sensor
///
/// Cheap to clone; clones observe the same listening state.
#[derive(Clone)]
pub struct MockCollisionSensor {
    actor_id: ActorId,
    shared: Arc<Shared>,
}

impl MockCollisionSensor {
    /// Create new mock sensor (not listening)
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Deliver one event to the registered callback
    ///
    /// Returns false (event dropped) if the sensor is not listening.
    pub fn emit(&self, event: CollisionEvent) -> bool {
        let guard = self.shared.callback.lock().unwrap();
        if !self.shared.listening.load(Ordering::SeqCst) {
            trace!(actor_id = self.actor_id, "collision dropped, sensor stopped");
            return false;
        }
        match guard.as_ref() {
            Some(callback) => {
                callback(event);
                self.shared.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Number of events delivered to a callback so far
    pub fn delivered(&self) -> u64 {
        self.shared.delivered.load(Ordering::Relaxed)
    }
}

impl CollisionSensor for MockCollisionSensor {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn listen(&self, callback: CollisionCallback) {
        let mut guard = self.shared.callback.lock().unwrap();
        // Idempotent: if already listening, keep the first callback
        if self.shared.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        *guard = Some(callback);
        debug!(actor_id = self.actor_id, "mock collision sensor listening");
    }

    fn stop(&self) {
        let mut guard = self.shared.callback.lock().unwrap();
        if self.shared.listening.swap(false, Ordering::SeqCst) {
            guard.take();
            debug!(actor_id = self.actor_id, "mock collision sensor stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Vector3;
    use std::sync::atomic::AtomicUsize;

    fn event(t: f64) -> CollisionEvent {
        CollisionEvent {
            timestamp: t,
            other_actor_id: 7,
            normal_impulse: Vector3::new(100.0, 0.0, 0.0),
        }
    }

    #[test]
    fn test_emit_requires_listen() {
        let sensor = MockCollisionSensor::new(1);
        assert!(!sensor.emit(event(0.0)));

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        sensor.listen(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(sensor.is_listening());
        assert!(sensor.emit(event(0.1)));
        assert!(sensor.emit(event(0.2)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(sensor.delivered(), 2);
    }

    #[test]
    fn test_no_delivery_after_stop() {
        let sensor = MockCollisionSensor::new(1);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        sensor.listen(Arc::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        sensor.stop();
        assert!(!sensor.is_listening());
        assert!(!sensor.emit(event(1.0)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Stop is idempotent
        sensor.stop();
    }

    #[test]
    fn test_clone_shares_state() {
        let sensor = MockCollisionSensor::new(3);
        let clone = sensor.clone();
        sensor.listen(Arc::new(|_| {}));
        assert!(clone.is_listening());
        clone.stop();
        assert!(!sensor.is_listening());
    }
}
