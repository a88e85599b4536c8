//! RoundActors - Actor Lifecycle Manager output
//!
//! Runtime actor handles for one round.

use crate::Transform;

/// Engine actor handle type
pub type ActorId = u32;

/// Controlled vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoActor {
    pub actor_id: ActorId,
    pub spawn_transform: Transform,
    /// Engine autopilot currently driving this actor
    pub autopilot: bool,
}

/// Collision sensor attached to the ego
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorHandle {
    pub actor_id: ActorId,
    pub parent_id: ActorId,
}

/// Background traffic vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientActor {
    pub actor_id: ActorId,
    pub spawn_transform: Transform,
    pub autopilot: bool,
}

/// All actors alive during one round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundActors {
    pub ego: EgoActor,
    pub sensor: SensorHandle,
    pub ambient: Vec<AmbientActor>,
}

impl RoundActors {
    /// All actor handles in mandatory teardown order
    pub fn teardown_order(&self) -> Vec<ActorId> {
        std::iter::once(self.sensor.actor_id)
            .chain(std::iter::once(self.ego.actor_id))
            .chain(self.ambient.iter().map(|a| a.actor_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teardown_order_sensor_first() {
        let actors = RoundActors {
            ego: EgoActor {
                actor_id: 10,
                spawn_transform: Transform::default(),
                autopilot: false,
            },
            sensor: SensorHandle {
                actor_id: 11,
                parent_id: 10,
            },
            ambient: vec![AmbientActor {
                actor_id: 12,
                spawn_transform: Transform::default(),
                autopilot: true,
            }],
        };
        assert_eq!(actors.teardown_order(), vec![11, 10, 12]);
    }
}
