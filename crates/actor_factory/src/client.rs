//! Simulation engine client abstraction
//!
//! Defines traits for interacting with the engine, supporting real implementation and mock testing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ActorId, CollisionSensor, EngineSnapshot, RoadMap, TrafficManagerConfig, Transform,
    VehicleControl,
};

use crate::error::Result;

/// Engine client trait
///
/// Abstracts the engine operations used by the scenario controller.
/// Supports unified interface for real CARLA client and Mock client.
pub trait SimClient: Send + Sync {
    /// Connect to engine server
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Name of the currently loaded map
    fn map_name(&self) -> impl Future<Output = Result<String>> + Send;

    /// Load a different map (destroys all actors engine-side)
    fn load_map(&self, map: &str) -> impl Future<Output = Result<()>> + Send;

    /// Apply global traffic manager tuning
    fn configure_traffic_manager(
        &self,
        config: &TrafficManagerConfig,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn vehicle
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "vehicle.tesla.model3"
    /// * `transform` - Initial pose
    /// * `role_name` - `role_name` attribute; set for the controlled vehicle only
    ///
    /// # Returns
    /// Newly created actor ID
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: Option<&str>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn a collision sensor attached to `parent_id`
    fn spawn_collision_sensor(
        &self,
        parent_id: ActorId,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Hand the vehicle to (or take it from) the engine autopilot
    fn set_autopilot(
        &self,
        actor_id: ActorId,
        enabled: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Apply actuation to a vehicle
    fn apply_control(
        &self,
        actor_id: ActorId,
        control: VehicleControl,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Query everything the encoder needs for one tick
    fn snapshot(&self, ego_id: ActorId) -> impl Future<Output = Result<EngineSnapshot>> + Send;

    /// Read-only lane graph of the loaded map, None if not connected
    fn road_map(&self) -> Option<Arc<dyn RoadMap>>;

    /// Get the collision sensor source for a spawned sensor actor
    ///
    /// Returns None if actor doesn't exist or isn't a collision sensor.
    fn collision_sensor(&self, actor_id: ActorId) -> Option<Box<dyn CollisionSensor>>;
}
