//! EngineSnapshot - one tick's raw engine state
//!
//! Queried from the simulation engine at the top of a tick and handed to the
//! observation encoder. Collections are unbounded; the encoder reduces them.

use serde::{Deserialize, Serialize};

use crate::{ActorId, Location, Transform, Vector3, VehicleControl};

/// Complete engine-side state needed to build one observation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Engine simulation time (seconds)
    pub timestamp: f64,

    /// Controlled vehicle state
    pub ego: EgoState,

    /// Every other vehicle in the world (ego excluded by the encoder)
    pub vehicles: Vec<VehicleState>,

    /// Every traffic light in the world
    pub traffic_lights: Vec<TrafficLightInfo>,

    /// Current weather parameters
    pub weather: WeatherState,
}

/// Ego kinematic and actuation state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EgoState {
    pub actor_id: ActorId,
    pub transform: Transform,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    pub angular_velocity: Vector3,
    pub control: VehicleControl,
    /// Wheel positions in world coordinates (usually 4)
    #[serde(default)]
    pub wheel_positions: Vec<Location>,
}

impl EgoState {
    /// Speed magnitude (m/s)
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

/// Another vehicle as seen by the ego
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VehicleState {
    pub actor_id: ActorId,
    pub location: Location,
    pub velocity: Vector3,
}

/// Traffic light state, numbered as the engine reports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightState {
    Red,
    Yellow,
    Green,
    Off,
    #[default]
    Unknown,
}

impl LightState {
    /// Numeric code used in the observation vector
    pub fn code(self) -> f32 {
        match self {
            Self::Red => 0.0,
            Self::Yellow => 1.0,
            Self::Green => 2.0,
            Self::Off => 3.0,
            Self::Unknown => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrafficLightInfo {
    pub actor_id: ActorId,
    pub location: Location,
    pub state: LightState,
}

/// Environmental parameters passed through unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub cloudiness: f64,
    pub precipitation: f64,
    pub precipitation_deposits: f64,
    pub wind_intensity: f64,
    pub fog_density: f64,
    pub wetness: f64,
}
