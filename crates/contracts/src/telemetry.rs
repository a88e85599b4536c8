//! Telemetry - per-tick display feed and its sink trait
//!
//! Read-only: nothing flows back from consumers into control.

use serde::{Deserialize, Serialize};

use crate::{ContractError, ControlMode, Location};

/// Per-tick telemetry record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Zero-based round index (always `< max_rounds`)
    pub round_index: u32,
    pub max_rounds: u32,
    /// Seconds left in the current round
    pub time_remaining: f64,
    pub mode: ControlMode,
    /// km/h
    pub speed_kmh: f64,
    pub heading: f64,
    pub steer: f32,
    pub throttle: f32,
    pub brake: f32,
    pub gear: i32,
    pub location: Location,
    pub ambient_count: usize,
    pub cumulative_reward: f64,
}

/// Telemetry output trait
///
/// All telemetry sink implementations must implement this trait.
#[trait_variant::make(TelemetrySink: Send)]
pub trait LocalTelemetrySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one telemetry record
    async fn write(&mut self, telemetry: &Telemetry) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
