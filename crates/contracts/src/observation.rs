//! Observation - Encoder output
//!
//! Fixed-shape numeric feature bundle. Every field is a fixed-size array so
//! the shape is enforced by the type; missing data is zero-filled.

use serde::{Deserialize, Serialize};

/// Radar sectors around the ego heading
pub const RADAR_SECTORS: usize = 8;
/// Values per radar sector: distance, relative speed, TTC, bearing
pub const RADAR_FEATURES: usize = 4;
/// Waypoint lookahead steps
pub const LOOKAHEAD_STEPS: usize = 10;
/// Values per lookahead waypoint: x, y, z, heading
pub const WAYPOINT_FEATURES: usize = 4;
/// Wheels reported in the observation
pub const WHEEL_COUNT: usize = 4;
pub const LANE_INFO_LEN: usize = 8;
pub const CONTROL_STATE_LEN: usize = 5;
pub const TRAFFIC_LIGHT_LEN: usize = 2;
pub const WEATHER_LEN: usize = 6;
pub const DANGER_LEN: usize = 5;

/// Flattened observation length
pub const OBSERVATION_DIM: usize = 3 * 5
    + CONTROL_STATE_LEN
    + WHEEL_COUNT * 3
    + LANE_INFO_LEN
    + LOOKAHEAD_STEPS * WAYPOINT_FEATURES
    + RADAR_SECTORS * RADAR_FEATURES
    + TRAFFIC_LIGHT_LEN
    + WEATHER_LEN
    + DANGER_LEN;

/// One tick's encoded environment snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Engine timestamp of the snapshot this was built from
    pub timestamp: f64,

    // kinematics
    pub velocity: [f32; 3],
    pub acceleration: [f32; 3],
    pub angular_velocity: [f32; 3],
    pub location: [f32; 3],
    /// pitch, yaw, roll
    pub rotation: [f32; 3],
    /// throttle, steer, brake, hand_brake, reverse
    pub control_state: [f32; CONTROL_STATE_LEN],
    pub wheel_positions: [[f32; 3]; WHEEL_COUNT],

    /// lane_width, is_junction, is_intersection, change_left, change_right,
    /// change_both, has_left_lane, has_right_lane
    pub lane_info: [f32; LANE_INFO_LEN],

    /// (x, y, z, heading) per lookahead step
    pub waypoints: [[f32; WAYPOINT_FEATURES]; LOOKAHEAD_STEPS],

    /// (distance, relative_speed, ttc, bearing) per sector
    pub vehicle_radar: [[f32; RADAR_FEATURES]; RADAR_SECTORS],

    /// (distance or 100, state or -1)
    pub traffic_light: [f32; TRAFFIC_LIGHT_LEN],

    /// cloudiness, precipitation, precipitation_deposits, wind_intensity,
    /// fog_density, wetness
    pub weather: [f32; WEATHER_LEN],

    /// lane_deviation, distance_to_edge, road_curvature, speed, accel_magnitude
    pub danger: [f32; DANGER_LEN],
}

impl Observation {
    /// Flatten into a single vector of length [`OBSERVATION_DIM`]
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(OBSERVATION_DIM);
        out.extend_from_slice(&self.velocity);
        out.extend_from_slice(&self.acceleration);
        out.extend_from_slice(&self.angular_velocity);
        out.extend_from_slice(&self.location);
        out.extend_from_slice(&self.rotation);
        out.extend_from_slice(&self.control_state);
        self.wheel_positions
            .iter()
            .for_each(|w| out.extend_from_slice(w));
        out.extend_from_slice(&self.lane_info);
        self.waypoints.iter().for_each(|w| out.extend_from_slice(w));
        self.vehicle_radar
            .iter()
            .for_each(|s| out.extend_from_slice(s));
        out.extend_from_slice(&self.traffic_light);
        out.extend_from_slice(&self.weather);
        out.extend_from_slice(&self.danger);
        out
    }

    /// Speed magnitude (m/s)
    ///
    /// Read from the kinematics block, which stays populated when the danger
    /// vector degrades to zeros.
    pub fn speed(&self) -> f32 {
        let [x, y, z] = self.velocity;
        (x * x + y * y + z * z).sqrt()
    }

    /// Lane-center lateral deviation (m) from the danger vector
    pub fn lane_deviation(&self) -> f32 {
        self.danger[0]
    }

    /// Nearest radar distance over occupied sectors
    pub fn nearest_vehicle_distance(&self) -> Option<f32> {
        self.vehicle_radar
            .iter()
            .map(|s| s[0])
            .filter(|d| *d > 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }
}
