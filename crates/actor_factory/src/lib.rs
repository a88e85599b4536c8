//! # Actor Factory
//!
//! Simulation actor lifecycle module.
//!
//! Responsibilities:
//! - Abstract the engine behind `SimClient`
//! - Spawn ego, collision sensor and ambient traffic per round
//! - Ordered, best-effort teardown
//! - Provide unified `CollisionSensor` abstraction
//! - Offline mock engine for tests and dry runs
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod lifecycle;
pub mod mock_client;
pub mod mock_road;
pub mod mock_sensor;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_collision_sensor;
#[cfg(feature = "real-carla")]
pub mod carla_convert;
#[cfg(feature = "real-carla")]
pub mod carla_road_map;

pub use client::SimClient;
pub use contracts::{ActorId, CollisionSensor, RoundActors};
pub use error::{ActorFactoryError, Result};
pub use lifecycle::{ActorLifecycleManager, SpawnConfig, TeardownReport};
pub use mock_client::{MockConfig, MockEvent, MockSimClient};
pub use mock_road::MockRoad;
pub use mock_sensor::MockCollisionSensor;

#[cfg(feature = "real-carla")]
pub use carla_client::RealSimClient;
#[cfg(feature = "real-carla")]
pub use carla_collision_sensor::CarlaCollisionSensor;
