//! 奖励整形

use contracts::{Observation, RewardFlags};

use crate::config::RewardWeights;

/// 正前方扇区
const FRONT_SECTOR: usize = 0;

/// 由观测与标志计算标量奖励
///
/// 碰撞直接返回惩罚值；其余项累加：速度进度、车道偏离、超速、前车过近、离开路面。
pub fn shaped_reward(
    observation: &Observation,
    flags: RewardFlags,
    weights: &RewardWeights,
    target_speed: f64,
) -> f64 {
    if flags.collision {
        return -weights.collision;
    }

    let speed = observation.speed() as f64;
    let mut reward = weights.progress * (speed.min(target_speed) / target_speed.max(f64::EPSILON));

    reward -= weights.lane_deviation * observation.lane_deviation() as f64;

    if speed > target_speed * 1.5 {
        reward -= weights.overspeed * (speed - target_speed * 1.5);
    }

    let front = observation.vehicle_radar[FRONT_SECTOR][0] as f64;
    if front > 0.0 && front < weights.safe_distance {
        reward -= weights.proximity * (1.0 - front / weights.safe_distance);
    }

    if flags.off_road {
        reward -= weights.off_road;
    }
    reward
}
