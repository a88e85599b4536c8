//! 奖励与经验协调
//!
//! 每个 learned 模式的 tick：用上一 tick 的 (观测, 动作) 和当前观测组成经验，
//! 交给 agent 并触发一次训练，然后为当前观测选择新动作。
//! 碰撞事件经去抖后生成一条终止经验，并立即训练。

use contracts::{
    Action, CollisionEvent, ExperienceTuple, LearningAgent, Observation, RewardFlags,
};
use tracing::{debug, trace, warn};

use crate::collision::CollisionDebouncer;
use crate::state::RoundState;

/// 单个碰撞事件的处理结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// 落在冷却窗口内
    Debounced,
    /// 被接受但不产生经验 (autopilot 模式或本轮尚无上一观测)
    Counted,
    /// 产生一条终止经验
    Rewarded(f64),
}

pub struct RewardCoordinator {
    debouncer: CollisionDebouncer,
    previous: Option<(Observation, Action)>,
    experiences: u64,
    train_failures: u64,
}

impl RewardCoordinator {
    pub fn new(collision_cooldown_sec: f64) -> Self {
        Self {
            debouncer: CollisionDebouncer::new(collision_cooldown_sec),
            previous: None,
            experiences: 0,
            train_failures: 0,
        }
    }

    /// 新一轮开始：清空上一观测/动作
    pub fn reset_round(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&(Observation, Action)> {
        self.previous.as_ref()
    }

    /// 已交给 agent 的经验数
    pub fn experiences(&self) -> u64 {
        self.experiences
    }

    pub fn train_failures(&self) -> u64 {
        self.train_failures
    }

    fn push_and_train<A: LearningAgent + ?Sized>(&mut self, agent: &mut A, exp: ExperienceTuple) {
        agent.store_experience(exp);
        self.experiences += 1;
        if let Err(e) = agent.train() {
            self.train_failures += 1;
            warn!(error = %e, "training step failed");
        }
    }

    /// 处理一个碰撞事件
    ///
    /// 去抖时间戳不论模式都会更新；只有 learned 模式且存在上一观测时才计算奖励。
    /// 奖励基于上一观测 (collision = true)，`next_observation` 缺失时用上一观测代替。
    pub fn on_collision<A: LearningAgent + ?Sized>(
        &mut self,
        agent: &mut A,
        round: &mut RoundState,
        event: &CollisionEvent,
        learned: bool,
        next_observation: Option<&Observation>,
    ) -> CollisionOutcome {
        if !self.debouncer.accept(event.timestamp) {
            trace!(timestamp = event.timestamp, "collision debounced");
            return CollisionOutcome::Debounced;
        }

        let Some((prev_obs, prev_action)) = self.previous.filter(|_| learned) else {
            debug!(
                round = round.index,
                other_actor_id = event.other_actor_id,
                "collision counted without experience"
            );
            return CollisionOutcome::Counted;
        };

        let reward = agent.calculate_reward(
            &prev_obs,
            RewardFlags {
                collision: true,
                off_road: false,
            },
        );
        round.cumulative_reward += reward;

        self.push_and_train(
            agent,
            ExperienceTuple {
                observation: prev_obs,
                action: prev_action,
                reward,
                next_observation: *next_observation.unwrap_or(&prev_obs),
                done: true,
            },
        );

        debug!(
            round = round.index,
            other_actor_id = event.other_actor_id,
            intensity = event.intensity(),
            reward,
            "collision rewarded"
        );
        CollisionOutcome::Rewarded(reward)
    }

    /// learned 模式下的一个 tick，返回为当前观测选出的动作
    pub fn on_tick<A: LearningAgent + ?Sized>(
        &mut self,
        agent: &mut A,
        round: &mut RoundState,
        current: Observation,
        off_road: bool,
    ) -> Action {
        if let Some((prev_obs, prev_action)) = self.previous {
            let reward = agent.calculate_reward(
                &current,
                RewardFlags {
                    collision: false,
                    off_road,
                },
            );
            round.cumulative_reward += reward;
            self.push_and_train(
                agent,
                ExperienceTuple {
                    observation: prev_obs,
                    action: prev_action,
                    reward,
                    next_observation: current,
                    done: false,
                },
            );
        }

        let action = agent.select_action(&current);
        self.previous = Some((current, action));
        action
    }
}
