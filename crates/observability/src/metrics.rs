//! 场景运行指标
//!
//! 控制循环内的 tick/碰撞/快照指标由各 crate 直接通过 `metrics` 宏记录；
//! 本模块负责运行结束时的汇总指标与内存中的轮次统计。

use metrics::{counter, gauge};

/// 记录一次运行的结果
pub fn record_run_outcome(rounds_completed: u32, stopped_by_operator: bool) {
    let outcome = if stopped_by_operator {
        "stopped"
    } else {
        "completed"
    };
    counter!("scenario_runs_total", "outcome" => outcome).increment(1);
    gauge!("scenario_rounds_completed").set(rounds_completed as f64);
}

/// 记录遥测 sink 的最终计数
pub fn record_sink_totals(sink_name: &str, written: u64, failed: u64, dropped: u64) {
    let sink = sink_name.to_string();
    counter!("scenario_telemetry_written_total", "sink" => sink.clone()).increment(written);
    counter!("scenario_telemetry_failed_total", "sink" => sink.clone()).increment(failed);
    counter!("scenario_telemetry_dropped_total", "sink" => sink).increment(dropped);
}

/// 轮次统计聚合器
///
/// 在内存中聚合每轮的累计奖励与时长，便于输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RoundStatsAggregator {
    /// 已结束的轮数
    pub rounds: u64,

    /// 累计奖励统计
    pub reward_stats: RunningStats,

    /// 轮次时长统计 (秒)
    pub length_stats: RunningStats,

    /// 奖励最高的一轮 (下标, 奖励)
    best: Option<(u64, f64)>,
}

impl RoundStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一轮
    pub fn update_round(&mut self, reward: f64, length_sec: f64) {
        let index = self.rounds;
        self.rounds += 1;
        self.reward_stats.push(reward);
        self.length_stats.push(length_sec);

        if self.best.is_none_or(|(_, best)| reward > best) {
            self.best = Some((index, reward));
        }
    }

    pub fn summary(&self) -> RoundStatsSummary {
        RoundStatsSummary {
            rounds: self.rounds,
            reward: StatsSummary::from(&self.reward_stats),
            length_sec: StatsSummary::from(&self.length_stats),
            best_round: self.best,
        }
    }
}

/// 轮次统计摘要
#[derive(Debug, Clone, Default)]
pub struct RoundStatsSummary {
    pub rounds: u64,
    pub reward: StatsSummary,
    pub length_sec: StatsSummary,
    pub best_round: Option<(u64, f64)>,
}

impl std::fmt::Display for RoundStatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Round Summary ===")?;
        writeln!(f, "Rounds: {}", self.rounds)?;
        writeln!(f, "Reward: {}", self.reward)?;
        writeln!(f, "Length (s): {}", self.length_sec)?;
        if let Some((index, reward)) = self.best_round {
            writeln!(f, "Best round: #{index} ({reward:.3})")?;
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_tracks_best_round() {
        let mut aggregator = RoundStatsAggregator::new();
        aggregator.update_round(-120.0, 30.0);
        aggregator.update_round(45.5, 30.0);
        aggregator.update_round(12.0, 29.9);

        let summary = aggregator.summary();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.best_round, Some((1, 45.5)));
        assert_eq!(summary.reward.count, 3);
        assert!((summary.reward.min + 120.0).abs() < 1e-10);
        assert!((summary.length_sec.max - 30.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RoundStatsAggregator::new();
        aggregator.update_round(10.0, 30.0);

        let output = aggregator.summary().to_string();
        assert!(output.contains("Rounds: 1"));
        assert!(output.contains("Best round: #0 (10.000)"));
    }

    #[test]
    fn test_empty_summary() {
        let output = RoundStatsAggregator::new().summary().to_string();
        assert!(output.contains("Reward: N/A"));
        assert!(!output.contains("Best round"));
    }
}
