//! CollisionSensor trait - collision event source abstraction
//!
//! Defines a unified interface for the collision sensor bound to the ego,
//! so the lifecycle manager handles real CARLA sensors and mock sensors the
//! same way.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{ActorId, Vector3};

/// A single collision reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Engine simulation time (seconds)
    pub timestamp: f64,

    /// Actor the ego collided with (0 for static geometry)
    pub other_actor_id: ActorId,

    /// Normal impulse of the contact
    pub normal_impulse: Vector3,
}

impl CollisionEvent {
    /// Impulse magnitude
    pub fn intensity(&self) -> f64 {
        self.normal_impulse.length()
    }
}

/// Collision callback type
///
/// Invoked on the engine's callback thread.
pub type CollisionCallback = Arc<dyn Fn(CollisionEvent) + Send + Sync>;

/// Collision sensor trait
///
/// # Lifetime
///
/// The callback must not be invoked after `stop()` returns. The lifecycle
/// manager relies on this to destroy the parent actor safely.
pub trait CollisionSensor: Send + Sync {
    /// Sensor actor handle
    fn actor_id(&self) -> ActorId;

    /// Register callback; repeated calls while listening are ignored
    fn listen(&self, callback: CollisionCallback);

    /// Unregister callback and stop event delivery
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
