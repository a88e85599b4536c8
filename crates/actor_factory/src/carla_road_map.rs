//! CARLA 道路图封装
//!
//! Only compiled when `real-carla` feature is enabled.

use std::sync::Mutex;

use carla::client::{Map, Waypoint as CarlaWaypoint};
use carla::rpc::LaneChangeType;
use contracts::{LaneChange, Location, RoadMap, Waypoint};

use crate::carla_convert::{from_carla_transform, to_carla_location};

/// 地图句柄只在锁内访问
pub struct CarlaRoadMap {
    map: Mutex<Map>,
}

impl CarlaRoadMap {
    pub fn new(map: Map) -> Self {
        Self {
            map: Mutex::new(map),
        }
    }
}

fn convert(wp: &CarlaWaypoint) -> Waypoint {
    let lane_change = match wp.lane_change() {
        LaneChangeType::Left => LaneChange::Left,
        LaneChangeType::Right => LaneChange::Right,
        LaneChangeType::Both => LaneChange::Both,
        _ => LaneChange::None,
    };
    Waypoint {
        id: wp.id(),
        transform: from_carla_transform(&wp.transform()),
        lane_width: wp.lane_width() as f64,
        is_junction: wp.is_junction(),
        is_intersection: wp.is_intersection(),
        lane_change,
        has_left_lane: wp.left().is_some(),
        has_right_lane: wp.right().is_some(),
    }
}

impl RoadMap for CarlaRoadMap {
    fn nearest_waypoint(&self, location: &Location) -> Option<Waypoint> {
        let map = self.map.lock().ok()?;
        map.waypoint(&to_carla_location(location))
            .map(|wp| convert(&wp))
    }

    fn next(&self, waypoint: &Waypoint, distance: f64) -> Vec<Waypoint> {
        let Ok(map) = self.map.lock() else {
            return Vec::new();
        };
        let Some(start) = map.waypoint(&to_carla_location(&waypoint.transform.location)) else {
            return Vec::new();
        };
        start
            .next(distance)
            .iter()
            .map(|wp| convert(&wp))
            .collect()
    }
}
