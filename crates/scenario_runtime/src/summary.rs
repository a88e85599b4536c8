//! 运行总结

use std::path::PathBuf;

use contracts::ControlMode;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// 正常到时结束的轮数
    pub rounds_completed: u32,
    pub ticks: u64,
    /// 快照超时或失败的 tick 数
    pub observation_misses: u64,
    /// 去抖后计入的碰撞数
    pub collisions: u64,
    pub experiences: u64,
    pub round_rewards: Vec<f64>,
    pub round_lengths_sec: Vec<f64>,
    pub teardown_failures: usize,
    pub telemetry_exports: Vec<PathBuf>,
    pub stopped_by_operator: bool,
    pub final_mode: ControlMode,
}
