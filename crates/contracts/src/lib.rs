//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Round timing uses the controller's monotonic clock
//! - Engine timestamps (seconds, f64) tag snapshots and collision events

mod agent;
mod collision;
mod control;
mod encoder_config;
mod error;
mod geometry;
mod observation;
mod road_map;
mod runtime;
mod scenario;
mod snapshot;
mod telemetry;

pub use agent::*;
pub use collision::{CollisionCallback, CollisionEvent, CollisionSensor};
pub use control::*;
pub use encoder_config::EncoderConfig;
pub use error::*;
pub use geometry::*;
pub use observation::*;
pub use road_map::*;
pub use runtime::*;
pub use scenario::*;
pub use snapshot::*;
pub use telemetry::*;
