//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, TrafficLight, Vehicle, World};
use contracts::{
    ActorId, CollisionSensor, EgoState, EngineSnapshot, RoadMap, TrafficLightInfo,
    TrafficManagerConfig, Transform, VehicleControl, VehicleState,
};
use tracing::{debug, info, instrument, warn};

use crate::carla_collision_sensor::CarlaCollisionSensor;
use crate::carla_convert::{
    from_carla_control, from_carla_light_state, from_carla_location, from_carla_transform,
    from_carla_vector, from_carla_weather, to_carla_control, to_carla_transform,
};
use crate::carla_road_map::CarlaRoadMap;
use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};

const COLLISION_BLUEPRINT: &str = "sensor.other.collision";

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements SimClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealSimClient {
    /// CARLA client
    client: Arc<Mutex<Option<Client>>>,
    /// World reference (uses Mutex for interior mutability)
    world: Arc<Mutex<Option<World>>>,
    /// Created actors list (for teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

/// Actor type enumeration
#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

fn lock_poisoned(what: &str) -> ActorFactoryError {
    ActorFactoryError::ConnectionFailed {
        message: format!("{what} lock poisoned"),
    }
}

impl RealSimClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = self.world.lock().map_err(|_| lock_poisoned("world"))?;
        let world = world_guard
            .as_mut()
            .ok_or_else(|| ActorFactoryError::ConnectionFailed {
                message: "not connected to CARLA server".into(),
            })?;
        f(world)
    }

    fn with_client<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Client) -> Result<R>,
    {
        let mut guard = self.client.lock().map_err(|_| lock_poisoned("client"))?;
        let client = guard
            .as_mut()
            .ok_or_else(|| ActorFactoryError::ConnectionFailed {
                message: "not connected to CARLA server".into(),
            })?;
        f(client)
    }

    /// Save actor to registry for teardown
    fn store_actor(&self, actor_id: ActorId, actor: ActorType) -> Result<()> {
        self.actors
            .lock()
            .map_err(|_| lock_poisoned("actors"))?
            .insert(actor_id, actor);
        Ok(())
    }

    fn vehicle(&self, actor_id: ActorId, operation: &str) -> Result<Vehicle> {
        let actors = self.actors.lock().map_err(|_| lock_poisoned("actors"))?;
        match actors.get(&actor_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::actor_command(
                actor_id,
                operation,
                "vehicle not found",
            )),
        }
    }

    fn create_vehicle(
        world: &mut World,
        blueprint: &str,
        transform: &Transform,
        role_name: Option<&str>,
    ) -> Result<Vehicle> {
        let bp_library = world.blueprint_library();
        let mut vehicle_bp = bp_library.find(blueprint).ok_or_else(|| {
            ActorFactoryError::vehicle_spawn(blueprint, format!("blueprint '{blueprint}' not found"))
        })?;
        if let Some(role) = role_name {
            if !vehicle_bp.set_attribute("role_name", role) {
                warn!(role, "failed to set role_name attribute");
            }
        }

        let actor = world
            .spawn_actor(&vehicle_bp, &to_carla_transform(transform))
            .map_err(|e| ActorFactoryError::vehicle_spawn(blueprint, e.to_string()))?;

        Vehicle::try_from(actor).map_err(|_| {
            ActorFactoryError::vehicle_spawn(blueprint, "spawned actor is not a vehicle")
        })
    }

    fn create_collision_sensor(
        world: &mut World,
        parent: &Vehicle,
        parent_id: ActorId,
    ) -> Result<Sensor> {
        let sensor_bp = world
            .blueprint_library()
            .find(COLLISION_BLUEPRINT)
            .ok_or_else(|| {
                ActorFactoryError::sensor_spawn(
                    "collision",
                    format!("actor_{parent_id}"),
                    "collision blueprint not found",
                )
            })?;

        let actor = world
            .spawn_actor_attached(
                &sensor_bp,
                &to_carla_transform(&Transform::default()),
                parent,
                None,
            )
            .map_err(|e| {
                ActorFactoryError::sensor_spawn("collision", format!("actor_{parent_id}"), e.to_string())
            })?;

        Sensor::try_from(actor).map_err(|_| {
            ActorFactoryError::sensor_spawn(
                "collision",
                format!("actor_{parent_id}"),
                "spawned actor is not a sensor",
            )
        })
    }

    fn destroy_sensor_actor(sensor: Sensor, actor_id: ActorId) {
        if sensor.is_listening() {
            sensor.stop();
        }
        if !sensor.destroy() {
            warn!(actor_id, "destroy sensor returned false");
        }
    }

    fn ego_state(ego: &Vehicle) -> EgoState {
        let v = ego.velocity();
        let a = ego.acceleration();
        let w = ego.angular_velocity();
        EgoState {
            actor_id: ego.id(),
            transform: from_carla_transform(&ego.transform()),
            velocity: from_carla_vector(v.x, v.y, v.z),
            acceleration: from_carla_vector(a.x, a.y, a.z),
            angular_velocity: from_carla_vector(w.x, w.y, w.z),
            control: from_carla_control(&ego.control()),
            wheel_positions: ego
                .wheel_locations()
                .iter()
                .map(from_carla_location)
                .collect(),
        }
    }
}

impl SimClient for RealSimClient {
    #[instrument(name = "real_carla_connect", skip(self, timeout), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let mut client = Client::connect(host, port, None);
        client.set_timeout(timeout);
        let world = client.world();

        info!(map = %world.map().name(), "connected to CARLA server");

        *self.client.lock().map_err(|_| lock_poisoned("client"))? = Some(client);
        *self.world.lock().map_err(|_| lock_poisoned("world"))? = Some(world);
        Ok(())
    }

    async fn map_name(&self) -> Result<String> {
        self.with_world_mut(|world| Ok(world.map().name().to_string()))
    }

    #[instrument(name = "real_carla_load_map", skip(self), fields(map = %map))]
    async fn load_map(&self, map: &str) -> Result<()> {
        let world = self.with_client(|client| {
            client
                .load_world(map)
                .map_err(|e| ActorFactoryError::query("load_map", e.to_string()))
        })?;
        *self.world.lock().map_err(|_| lock_poisoned("world"))? = Some(world);
        self.actors.lock().map_err(|_| lock_poisoned("actors"))?.clear();
        Ok(())
    }

    async fn configure_traffic_manager(&self, config: &TrafficManagerConfig) -> Result<()> {
        self.with_client(|client| {
            let mut tm = client.instance_tm(Some(config.port));
            tm.set_global_distance_to_leading_vehicle(config.distance_to_leading_vehicle as f32);
            tm.set_global_percentage_speed_difference(config.global_speed_difference as f32);
            Ok(())
        })
    }

    #[instrument(
        name = "real_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint)
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: Option<&str>,
    ) -> Result<ActorId> {
        let vehicle = self
            .with_world_mut(|world| Self::create_vehicle(world, blueprint, &transform, role_name))?;
        let actor_id = vehicle.id();
        debug!(actor_id, blueprint, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle))?;
        Ok(actor_id)
    }

    #[instrument(name = "real_carla_spawn_collision_sensor", skip(self), fields(parent_id))]
    async fn spawn_collision_sensor(&self, parent_id: ActorId) -> Result<ActorId> {
        let parent = self.vehicle(parent_id, "attach_sensor")?;
        let sensor =
            self.with_world_mut(|world| Self::create_collision_sensor(world, &parent, parent_id))?;
        let actor_id = sensor.id();
        debug!(actor_id, parent_id, "collision sensor spawned and attached");
        self.store_actor(actor_id, ActorType::Sensor(sensor))?;
        Ok(actor_id)
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = self
            .actors
            .lock()
            .map_err(|_| lock_poisoned("actors"))?
            .remove(&actor_id);

        match removed {
            Some(ActorType::Vehicle(v)) => {
                if !v.destroy() {
                    return Err(ActorFactoryError::DestroyFailed {
                        actor_id,
                        message: "destroy returned false".into(),
                    });
                }
            }
            Some(ActorType::Sensor(s)) => Self::destroy_sensor_actor(s, actor_id),
            // Idempotent: return Ok even if not exists
            None => {}
        }
        Ok(())
    }

    async fn set_autopilot(&self, actor_id: ActorId, enabled: bool) -> Result<()> {
        self.vehicle(actor_id, "set_autopilot")?
            .set_autopilot(enabled);
        Ok(())
    }

    async fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()> {
        self.vehicle(actor_id, "apply_control")?
            .apply_control(&to_carla_control(&control));
        Ok(())
    }

    async fn snapshot(&self, ego_id: ActorId) -> Result<EngineSnapshot> {
        let ego = self.vehicle(ego_id, "snapshot")?;
        self.with_world_mut(|world| {
            let timestamp = world.snapshot().timestamp().elapsed_seconds;
            let mut vehicles = Vec::new();
            let mut traffic_lights = Vec::new();

            for actor in world.actors().iter() {
                let actor_id = actor.id();
                if actor_id == ego_id {
                    continue;
                }
                let location = from_carla_location(&actor.location());
                if actor.type_id().starts_with("vehicle.") {
                    let v = actor.velocity();
                    vehicles.push(VehicleState {
                        actor_id,
                        location,
                        velocity: from_carla_vector(v.x, v.y, v.z),
                    });
                } else if let Ok(light) = TrafficLight::try_from(actor) {
                    traffic_lights.push(TrafficLightInfo {
                        actor_id,
                        location,
                        state: from_carla_light_state(light.state()),
                    });
                }
            }

            Ok(EngineSnapshot {
                timestamp,
                ego: Self::ego_state(&ego),
                vehicles,
                traffic_lights,
                weather: from_carla_weather(&world.weather()),
            })
        })
    }

    fn road_map(&self) -> Option<Arc<dyn RoadMap>> {
        let guard = self.world.lock().ok()?;
        let world = guard.as_ref()?;
        Some(Arc::new(CarlaRoadMap::new(world.map())))
    }

    fn collision_sensor(&self, actor_id: ActorId) -> Option<Box<dyn CollisionSensor>> {
        let actors = self.actors.lock().ok()?;
        match actors.get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => {
                Some(Box::new(CarlaCollisionSensor::new(sensor.clone())))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    // Real client tests require CARLA server running
    // These tests are marked as ignore, only run when server is available

    use super::*;

    #[tokio::test]
    #[ignore = "requires CARLA server"]
    async fn test_real_client_connect() {
        let mut client = RealSimClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!client.map_name().await.unwrap().is_empty());
    }
}
