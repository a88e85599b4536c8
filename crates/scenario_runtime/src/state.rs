//! 轮次状态机
//!
//! `Idle → Setup → Running → Resetting → {Setup(index + 1) | Finished}`
//!
//! 状态机本身不做 I/O，由控制器在各转移点执行 spawn、teardown 和保存。

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::error::{Result, ScenarioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    Idle,
    Setup,
    Running,
    Resetting,
    Finished,
}

/// 一轮 episode
#[derive(Debug, Clone, PartialEq)]
pub struct RoundState {
    pub index: u32,
    pub started_at: Instant,
    pub duration: Duration,
    pub cumulative_reward: f64,
    /// 已到时或被中断
    pub terminal: bool,
}

impl RoundState {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }
}

#[derive(Debug)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    max_rounds: u32,
    round_duration: Duration,
    /// Setup 阶段对应的轮次下标
    next_index: u32,
    current: Option<RoundState>,
    setups: u32,
}

impl RoundStateMachine {
    pub fn new(max_rounds: u32, round_duration: Duration) -> Self {
        Self {
            phase: RoundPhase::Idle,
            max_rounds,
            round_duration,
            next_index: 0,
            current: None,
            setups: 0,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// 当前 (或正在准备的) 轮次下标
    pub fn round_index(&self) -> u32 {
        self.current
            .as_ref()
            .map_or(self.next_index, |round| round.index)
    }

    pub fn current(&self) -> Option<&RoundState> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut RoundState> {
        self.current.as_mut()
    }

    /// 进入过 Setup 的次数
    pub fn setups(&self) -> u32 {
        self.setups
    }

    fn expect(&self, from: RoundPhase, to: RoundPhase) -> Result<()> {
        if self.phase == from {
            Ok(())
        } else {
            Err(ScenarioError::invalid_transition(self.phase, to))
        }
    }

    fn enter_setup(&mut self, index: u32) {
        self.phase = RoundPhase::Setup;
        self.next_index = index;
        self.setups += 1;
        info!(round = index, max_rounds = self.max_rounds, "round setup");
    }

    /// Idle → Setup(0)；`max_rounds == 0` 时直接结束
    pub fn begin(&mut self) -> Result<RoundPhase> {
        self.expect(RoundPhase::Idle, RoundPhase::Setup)?;
        if self.max_rounds == 0 {
            self.phase = RoundPhase::Finished;
        } else {
            self.enter_setup(0);
        }
        Ok(self.phase)
    }

    /// Setup → Running，开始计时
    pub fn start_running(&mut self, now: Instant) -> Result<&RoundState> {
        self.expect(RoundPhase::Setup, RoundPhase::Running)?;
        self.phase = RoundPhase::Running;
        let round = self.current.insert(RoundState {
            index: self.next_index,
            started_at: now,
            duration: self.round_duration,
            cumulative_reward: 0.0,
            terminal: false,
        });
        info!(round = round.index, "round running");
        Ok(round)
    }

    /// Running → Resetting，返回关闭时的轮次快照
    pub fn begin_reset(&mut self) -> Result<RoundState> {
        self.expect(RoundPhase::Running, RoundPhase::Resetting)?;
        self.phase = RoundPhase::Resetting;
        let round = self
            .current
            .as_mut()
            .ok_or(ScenarioError::invalid_transition(
                RoundPhase::Running,
                RoundPhase::Resetting,
            ))?;
        round.terminal = true;
        Ok(round.clone())
    }

    /// Resetting → Setup(index + 1) 或 Finished
    pub fn finish_reset(&mut self) -> Result<RoundPhase> {
        self.expect(RoundPhase::Resetting, RoundPhase::Setup)?;
        let next = self.round_index() + 1;
        self.current = None;
        if next < self.max_rounds {
            self.enter_setup(next);
        } else {
            self.phase = RoundPhase::Finished;
            info!(rounds = next, "all rounds finished");
        }
        Ok(self.phase)
    }

    /// 操作员中断或致命 setup 失败：任何状态直接结束
    ///
    /// 调用方负责在此之前完成 teardown。
    pub fn finish(&mut self) {
        if let Some(round) = self.current.as_mut() {
            round.terminal = true;
        }
        self.phase = RoundPhase::Finished;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(max_rounds: u32) -> RoundStateMachine {
        RoundStateMachine::new(max_rounds, Duration::from_secs(30))
    }

    #[test]
    fn test_ten_rounds_ten_setups() {
        let mut m = machine(10);
        let now = Instant::now();
        let mut seen = Vec::new();

        assert_eq!(m.begin().unwrap(), RoundPhase::Setup);
        while m.phase() == RoundPhase::Setup {
            let index = m.start_running(now).unwrap().index;
            assert!(index < m.max_rounds());
            seen.push(index);
            m.begin_reset().unwrap();
            m.finish_reset().unwrap();
        }

        assert_eq!(m.phase(), RoundPhase::Finished);
        assert_eq!(m.setups(), 10);
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_rounds_finishes_immediately() {
        let mut m = machine(0);
        assert_eq!(m.begin().unwrap(), RoundPhase::Finished);
        assert_eq!(m.setups(), 0);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut m = machine(2);
        assert!(matches!(
            m.begin_reset(),
            Err(ScenarioError::InvalidTransition {
                from: RoundPhase::Idle,
                to: RoundPhase::Resetting
            })
        ));
        m.begin().unwrap();
        assert!(m.begin().is_err());
        assert!(m.finish_reset().is_err());
    }

    #[test]
    fn test_expiry_and_remaining() {
        let mut m = RoundStateMachine::new(1, Duration::from_secs(10));
        m.begin().unwrap();
        let start = Instant::now();
        m.start_running(start).unwrap();

        let round = m.current().unwrap();
        assert!(!round.is_expired(start + Duration::from_secs(9)));
        assert!(round.is_expired(start + Duration::from_secs(10)));
        assert_eq!(
            round.remaining(start + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
    }

    #[test]
    fn test_finish_from_running_marks_terminal() {
        let mut m = machine(3);
        m.begin().unwrap();
        m.start_running(Instant::now()).unwrap();
        m.finish();
        assert_eq!(m.phase(), RoundPhase::Finished);
        assert!(m.current().unwrap().terminal);
    }
}
