//! Agent 配置

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// ReplayAgent 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 经验回放容量，满后覆盖最旧经验
    pub replay_capacity: usize,
    /// 每次训练采样数
    pub batch_size: usize,
    /// 回放中少于此数量时跳过训练
    pub min_replay: usize,
    /// 初始探索率
    pub epsilon: f64,
    pub epsilon_min: f64,
    /// 每轮结束后的探索率衰减
    pub epsilon_decay: f64,
    pub learning_rate: f64,
    pub discount: f64,
    /// 期望巡航速度 (m/s)
    pub target_speed: f64,
    /// 固定随机种子，None 时取系统熵
    pub seed: Option<u64>,
    /// checkpoint 与训练历史输出目录
    pub checkpoint_dir: PathBuf,
    pub rewards: RewardWeights,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            replay_capacity: 50_000,
            batch_size: 32,
            min_replay: 64,
            epsilon: 0.1,
            epsilon_min: 0.01,
            epsilon_decay: 0.95,
            learning_rate: 1e-3,
            discount: 0.99,
            target_speed: 8.0,
            seed: None,
            checkpoint_dir: PathBuf::from("checkpoints"),
            rewards: RewardWeights::default(),
        }
    }
}

/// 奖励整形权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub progress: f64,
    pub lane_deviation: f64,
    pub overspeed: f64,
    /// 前车距离小于此值开始惩罚 (m)
    pub safe_distance: f64,
    pub proximity: f64,
    pub collision: f64,
    pub off_road: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            progress: 1.0,
            lane_deviation: 0.5,
            overspeed: 0.5,
            safe_distance: 5.0,
            proximity: 1.0,
            collision: 100.0,
            off_road: 50.0,
        }
    }
}
