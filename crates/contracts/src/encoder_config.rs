//! Observation encoder constants
//!
//! Shared between config loader (as overrides) and the encoder.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Encoder tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EncoderConfig {
    /// Only vehicles closer than this enter the radar (m)
    #[serde(default = "default_radar_radius")]
    #[validate(range(min = 0.0))]
    pub radar_radius: f64,

    /// Only traffic lights closer than this are considered (m)
    #[serde(default = "default_light_radius")]
    #[validate(range(min = 0.0))]
    pub traffic_light_radius: f64,

    /// Lookahead step distance (m)
    #[serde(default = "default_lookahead_step")]
    #[validate(range(min = 0.1))]
    pub lookahead_step: f64,

    /// Distance of the curvature probe waypoint (m)
    #[serde(default = "default_curvature_probe")]
    #[validate(range(min = 0.1))]
    pub curvature_probe: f64,

    /// TTC reported when vehicles are not closing
    #[serde(default = "default_sentinel")]
    pub ttc_sentinel: f64,

    /// Traffic light distance reported when none is in range
    #[serde(default = "default_sentinel")]
    pub light_distance_sentinel: f64,
}

fn default_radar_radius() -> f64 {
    100.0
}

fn default_light_radius() -> f64 {
    50.0
}

fn default_lookahead_step() -> f64 {
    5.0
}

fn default_curvature_probe() -> f64 {
    2.0
}

fn default_sentinel() -> f64 {
    100.0
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            radar_radius: default_radar_radius(),
            traffic_light_radius: default_light_radius(),
            lookahead_step: default_lookahead_step(),
            curvature_probe: default_curvature_probe(),
            ttc_sentinel: default_sentinel(),
            light_distance_sentinel: default_sentinel(),
        }
    }
}
