//! RoadMap trait - read-only drivable-lane graph
//!
//! The encoder walks this graph for waypoint lookahead, lane geometry and
//! danger metrics. Real implementations wrap the engine map; tests use a
//! scripted road.

use serde::{Deserialize, Serialize};

use crate::{Location, Transform};

/// Allowed lane-change directions at a waypoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneChange {
    #[default]
    None,
    Left,
    Right,
    Both,
}

/// A discrete point on the lane graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Engine-side identifier
    pub id: u64,
    pub transform: Transform,
    pub lane_width: f64,
    pub is_junction: bool,
    pub is_intersection: bool,
    pub lane_change: LaneChange,
    pub has_left_lane: bool,
    pub has_right_lane: bool,
}

/// Read-only map graph queries
pub trait RoadMap: Send + Sync {
    /// Waypoint on the nearest drivable lane, `None` if off the map
    fn nearest_waypoint(&self, location: &Location) -> Option<Waypoint>;

    /// Successor waypoints `distance` metres ahead, one per branch.
    ///
    /// Branch order is whatever the engine returns; callers that need a
    /// single successor take the first entry.
    fn next(&self, waypoint: &Waypoint, distance: f64) -> Vec<Waypoint>;
}
