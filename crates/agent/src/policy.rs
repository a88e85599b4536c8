//! 启发式车道跟随策略
//!
//! 纯追踪：朝前视路点转向，按目标速度做比例油门，前车过近时刹车。

use contracts::{Action, Observation, WAYPOINT_FEATURES};

/// 追踪的前视路点下标 (第二个点，约 10 米)
const PURSUIT_INDEX: usize = 1;
/// 满舵对应的航向误差 (度)
const FULL_STEER_DEG: f32 = 45.0;
const THROTTLE_GAIN: f32 = 0.5;
/// 前车小于此距离时全力刹车 (m)
const EMERGENCY_DISTANCE: f32 = 10.0;

fn wrap_180(deg: f32) -> f32 {
    let d = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if d < -180.0 {
        d + 360.0
    } else {
        d
    }
}

fn is_empty_row(row: &[f32; WAYPOINT_FEATURES]) -> bool {
    row.iter().all(|v| *v == 0.0)
}

pub fn heuristic_action(observation: &Observation, target_speed: f32) -> Action {
    let target = [PURSUIT_INDEX, 0]
        .into_iter()
        .map(|i| &observation.waypoints[i])
        .find(|row| !is_empty_row(row));

    // 无路可循：原地停下
    let Some(target) = target else {
        return Action {
            throttle: 0.0,
            steer: 0.0,
            brake: 0.5,
        };
    };

    let [x, y, _] = observation.location;
    let yaw = observation.rotation[1];
    let bearing = (target[1] - y).atan2(target[0] - x).to_degrees();
    let steer = (wrap_180(bearing - yaw) / FULL_STEER_DEG).clamp(-1.0, 1.0);

    let speed = observation.speed();
    let front = observation.vehicle_radar[0][0];
    if front > 0.0 && front < EMERGENCY_DISTANCE {
        return Action {
            throttle: 0.0,
            steer,
            brake: 1.0,
        };
    }

    let throttle = ((target_speed - speed) * THROTTLE_GAIN).clamp(0.0, 1.0);
    let brake = if speed > target_speed + 2.0 { 0.3 } else { 0.0 };
    Action {
        throttle,
        steer,
        brake,
    }
}
