//! CARLA 碰撞传感器封装
//!
//! Wraps CARLA native `sensor.other.collision` as `CollisionSensor`.
//! Only compiled when `real-carla` feature is enabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carla::client::{ActorBase, Sensor};
use carla::sensor::data::CollisionEvent as CarlaCollisionEvent;
use carla::sensor::SensorDataBase;
use contracts::{ActorId, CollisionCallback, CollisionEvent, CollisionSensor};
use tracing::{debug, trace, warn};

use crate::carla_convert::from_carla_vector;

/// CARLA collision sensor wrapper
pub struct CarlaCollisionSensor {
    actor_id: ActorId,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
}

impl CarlaCollisionSensor {
    pub fn new(sensor: Sensor) -> Self {
        Self {
            actor_id: sensor.id(),
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CollisionSensor for CarlaCollisionSensor {
    fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    fn listen(&self, callback: CollisionCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(actor_id = self.actor_id, "collision sensor already listening");
            return;
        }

        let listening = self.listening.clone();
        let actor_id = self.actor_id;
        debug!(actor_id, "starting CARLA collision sensor");

        self.sensor.listen(move |data| {
            if !listening.load(Ordering::SeqCst) {
                return;
            }
            let timestamp = data.timestamp();
            match CarlaCollisionEvent::try_from(data) {
                Ok(event) => {
                    let impulse = event.normal_impulse();
                    let other_actor_id = event.other_actor().map(|a| a.id()).unwrap_or(0);
                    trace!(actor_id, other_actor_id, "collision received");
                    callback(CollisionEvent {
                        timestamp,
                        other_actor_id,
                        normal_impulse: from_carla_vector(impulse.x, impulse.y, impulse.z),
                    });
                }
                Err(_) => trace!(actor_id, "non-collision data on collision sensor"),
            }
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(actor_id = self.actor_id, "stopping CARLA collision sensor");
            self.sensor.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}
