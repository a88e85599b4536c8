//! 线性状态价值函数，TD(0) 更新

use contracts::{ExperienceTuple, Observation};
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 5;

/// 雷达距离归一化上限 (m)
const DISTANCE_SCALE: f32 = 100.0;

fn features(observation: &Observation) -> [f64; FEATURE_COUNT] {
    let nearest = observation
        .nearest_vehicle_distance()
        .unwrap_or(DISTANCE_SCALE)
        .min(DISTANCE_SCALE);
    [
        1.0,
        observation.speed() as f64 / 10.0,
        observation.lane_deviation() as f64,
        (nearest / DISTANCE_SCALE) as f64,
        observation.danger[1] as f64,
    ]
}

/// V(s) = w · φ(s)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearValue {
    pub weights: [f64; FEATURE_COUNT],
}

impl LinearValue {
    pub fn value(&self, observation: &Observation) -> f64 {
        features(observation)
            .iter()
            .zip(self.weights.iter())
            .map(|(f, w)| f * w)
            .sum()
    }

    /// 对一批经验做一次 TD(0) 更新，返回更新前的均方 TD 误差
    pub fn update<'a, I>(&mut self, batch: I, learning_rate: f64, discount: f64) -> f64
    where
        I: IntoIterator<Item = &'a ExperienceTuple>,
    {
        let mut sq_error = 0.0;
        let mut n = 0usize;
        for exp in batch {
            let bootstrap = if exp.done {
                0.0
            } else {
                discount * self.value(&exp.next_observation)
            };
            let td = exp.reward + bootstrap - self.value(&exp.observation);
            for (w, f) in self.weights.iter_mut().zip(features(&exp.observation)) {
                *w += learning_rate * td * f;
            }
            sq_error += td * td;
            n += 1;
        }
        if n == 0 {
            0.0
        } else {
            sq_error / n as f64
        }
    }
}
