//! 8 扇区车辆雷达
//!
//! 扇区以主车朝向为中心：扇区 0 覆盖 [-22.5°, 22.5°)，逆时针每 45° 一个扇区。
//! 每个扇区只保留最近的车辆；距离相等时保留先到的条目。

use contracts::{EgoState, VehicleState, RADAR_FEATURES, RADAR_SECTORS};
use nalgebra::Vector3;

const SECTOR_WIDTH_DEG: f64 = 360.0 / RADAR_SECTORS as f64;

/// 相对速度低于此值视为不接近，TTC 取哨兵值
const CLOSING_EPSILON: f64 = 1e-6;

/// 单个扇区的内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarReturn {
    pub distance: f64,
    pub relative_speed: f64,
    pub ttc: f64,
    /// 相对主车朝向的方位角，[0, 360)
    pub bearing: f64,
}

impl RadarReturn {
    fn to_row(self) -> [f32; RADAR_FEATURES] {
        [
            self.distance as f32,
            self.relative_speed as f32,
            self.ttc as f32,
            self.bearing as f32,
        ]
    }
}

/// 方位角 (度) 映射到扇区
pub fn sector_for_bearing(bearing_deg: f64) -> usize {
    let shifted = (bearing_deg + SECTOR_WIDTH_DEG / 2.0).rem_euclid(360.0);
    (shifted / SECTOR_WIDTH_DEG).floor() as usize % RADAR_SECTORS
}

fn to_na(v: &contracts::Vector3) -> Vector3<f64> {
    Vector3::new(v.x, v.y, v.z)
}

/// 把角度归一化到 [0, 360)
pub(crate) fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// 单车测量，超出半径返回 None
pub fn measure(
    ego: &EgoState,
    other: &VehicleState,
    radius: f64,
    ttc_sentinel: f64,
) -> Option<RadarReturn> {
    let relative = to_na(&ego.transform.location.delta(&other.location));
    let distance = relative.norm();
    if distance > radius {
        return None;
    }

    let relative_speed = (to_na(&other.velocity) - to_na(&ego.velocity)).norm();
    let ttc = if relative_speed > CLOSING_EPSILON {
        distance / relative_speed
    } else {
        ttc_sentinel
    };

    let forward = ego.transform.forward_vector();
    let heading = forward.y.atan2(forward.x).to_degrees();
    let bearing = normalize_deg(relative.y.atan2(relative.x).to_degrees() - heading);

    Some(RadarReturn {
        distance,
        relative_speed,
        ttc,
        bearing,
    })
}

/// 对候选车辆做归约，输出固定形状的雷达矩阵
pub fn reduce(returns: impl IntoIterator<Item = RadarReturn>) -> [Option<RadarReturn>; RADAR_SECTORS] {
    let mut sectors: [Option<RadarReturn>; RADAR_SECTORS] = [None; RADAR_SECTORS];
    for r in returns {
        let slot = &mut sectors[sector_for_bearing(r.bearing)];
        if slot.map_or(true, |existing| r.distance < existing.distance) {
            *slot = Some(r);
        }
    }
    sectors
}

/// 编码车辆雷达矩阵，空扇区全零
pub fn vehicle_radar(
    ego: &EgoState,
    vehicles: &[VehicleState],
    radius: f64,
    ttc_sentinel: f64,
) -> [[f32; RADAR_FEATURES]; RADAR_SECTORS] {
    let sectors = reduce(
        vehicles
            .iter()
            .filter(|v| v.actor_id != ego.actor_id)
            .filter_map(|v| measure(ego, v, radius, ttc_sentinel)),
    );
    sectors.map(|s| s.map_or([0.0; RADAR_FEATURES], RadarReturn::to_row))
}
