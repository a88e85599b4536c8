//! 危险指标
//!
//! lane_deviation, distance_to_edge, road_curvature, speed, accel_magnitude。
//! 任一步无法完成 (例如路点无法解析) 时整段为零。

use contracts::{EgoState, RoadMap, Waypoint, DANGER_LEN};

use crate::radar::normalize_deg;

/// 航向差折算到 [0, 180]
fn yaw_delta(a: f64, b: f64) -> f64 {
    let d = normalize_deg(b - a);
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

fn try_danger(
    ego: &EgoState,
    current: Option<&Waypoint>,
    map: &dyn RoadMap,
    curvature_probe: f64,
) -> Option<[f32; DANGER_LEN]> {
    let wp = current?;
    let location = ego.transform.location;
    let deviation = location.distance_2d(&wp.transform.location);
    let to_edge = wp.lane_width / 2.0 - deviation;

    let probe = map.next(wp, curvature_probe).into_iter().next()?;
    let curvature = yaw_delta(wp.transform.rotation.yaw, probe.transform.rotation.yaw);

    Some([
        deviation as f32,
        to_edge as f32,
        curvature as f32,
        ego.speed() as f32,
        ego.acceleration.length() as f32,
    ])
}

pub fn danger(
    ego: &EgoState,
    current: Option<&Waypoint>,
    map: &dyn RoadMap,
    curvature_probe: f64,
) -> [f32; DANGER_LEN] {
    try_danger(ego, current, map, curvature_probe).unwrap_or_else(|| {
        tracing::trace!(actor_id = ego.actor_id, "danger metrics unavailable");
        [0.0; DANGER_LEN]
    })
}
