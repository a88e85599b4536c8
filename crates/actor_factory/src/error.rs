//! Actor Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Actor Factory specific error
#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// Engine connection error
    #[error("failed to connect to engine: {message}")]
    ConnectionFailed { message: String },

    /// Vehicle spawn error
    #[error("failed to spawn vehicle '{vehicle_id}': {message}")]
    VehicleSpawnFailed { vehicle_id: String, message: String },

    /// Ego could not be spawned within the retry budget
    #[error("failed to spawn ego after {attempts} attempts: {message}")]
    EgoSpawnExhausted { attempts: u32, message: String },

    /// Sensor spawn error
    #[error("failed to spawn sensor '{sensor_id}' on vehicle '{vehicle_id}': {message}")]
    SensorSpawnFailed {
        sensor_id: String,
        vehicle_id: String,
        message: String,
    },

    /// A round is already spawned; tear it down first
    #[error("round actors already alive (ego actor {ego_id})")]
    RoundActive { ego_id: u32 },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: u32, message: String },

    /// Actor control / state call error
    #[error("actor {actor_id} {operation} failed: {message}")]
    ActorCommandFailed {
        actor_id: u32,
        operation: String,
        message: String,
    },

    /// Engine state query error
    #[error("engine query '{query}' failed: {message}")]
    QueryFailed { query: String, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    /// Create vehicle spawn error
    pub fn vehicle_spawn(vehicle_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// Create sensor spawn error
    pub fn sensor_spawn(
        sensor_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            sensor_id: sensor_id.into(),
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// Create actor command error
    pub fn actor_command(
        actor_id: u32,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ActorCommandFailed {
            actor_id,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create query error
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ActorFactoryError>;
