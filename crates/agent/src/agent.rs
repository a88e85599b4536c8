//! 默认学习代理
//!
//! 启发式车道跟随 + epsilon 随机探索，经验进入有界回放，
//! 训练步对线性价值函数做 TD(0) 更新。

use std::path::Path;

use contracts::{
    Action, ContractError, ExperienceTuple, LearningAgent, Observation, RewardFlags,
    TrainingHistory,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, trace};

use crate::checkpoint::{self, Checkpoint};
use crate::config::AgentConfig;
use crate::policy::heuristic_action;
use crate::replay::ReplayBuffer;
use crate::reward::shaped_reward;
use crate::value::LinearValue;

pub struct ReplayAgent {
    config: AgentConfig,
    replay: ReplayBuffer,
    value: LinearValue,
    rng: StdRng,
    epsilon: f64,
    train_steps: u64,
    last_loss: Option<f64>,
    history: TrainingHistory,
}

impl ReplayAgent {
    pub fn new(config: AgentConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            replay: ReplayBuffer::new(config.replay_capacity),
            value: LinearValue::default(),
            rng,
            epsilon: config.epsilon,
            train_steps: 0,
            last_loss: None,
            history: TrainingHistory::default(),
            config,
        }
    }

    /// 从 checkpoint 恢复价值函数、探索率和训练历史
    pub fn resume(config: AgentConfig, checkpoint_path: &Path) -> Result<Self, ContractError> {
        let ckpt = checkpoint::load(checkpoint_path)?;
        let history = match checkpoint_path.parent() {
            Some(dir) => checkpoint::load_history(dir)?,
            None => TrainingHistory::default(),
        };
        let mut agent = Self::new(config);
        agent.value = ckpt.value;
        agent.epsilon = ckpt.epsilon;
        agent.train_steps = ckpt.train_steps;
        agent.history = history;
        info!(
            round = ckpt.round_index,
            epsilon = agent.epsilon,
            "agent resumed from checkpoint"
        );
        Ok(agent)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn replay(&self) -> &ReplayBuffer {
        &self.replay
    }

    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn last_loss(&self) -> Option<f64> {
        self.last_loss
    }

    pub fn value(&self) -> &LinearValue {
        &self.value
    }

    fn explore(&mut self) -> Action {
        Action {
            throttle: self.rng.random_range(0.0..=1.0),
            steer: self.rng.random_range(-1.0..=1.0),
            brake: 0.0,
        }
    }
}

impl LearningAgent for ReplayAgent {
    fn select_action(&mut self, observation: &Observation) -> Action {
        if self.rng.random::<f64>() < self.epsilon {
            trace!(epsilon = self.epsilon, "exploring");
            return self.explore();
        }
        heuristic_action(observation, self.config.target_speed as f32)
    }

    fn calculate_reward(&self, observation: &Observation, flags: RewardFlags) -> f64 {
        shaped_reward(
            observation,
            flags,
            &self.config.rewards,
            self.config.target_speed,
        )
    }

    fn store_experience(&mut self, experience: ExperienceTuple) {
        self.replay.push(experience);
    }

    fn train(&mut self) -> Result<(), ContractError> {
        if self.replay.len() < self.config.min_replay.max(1) {
            return Ok(());
        }
        let batch = self.replay.sample(&mut self.rng, self.config.batch_size);
        let loss = self
            .value
            .update(batch, self.config.learning_rate, self.config.discount);
        if !loss.is_finite() {
            return Err(ContractError::agent(
                "train",
                format!("TD error diverged after {} steps", self.train_steps),
            ));
        }
        self.train_steps += 1;
        self.last_loss = Some(loss);
        trace!(step = self.train_steps, loss, "train step");
        Ok(())
    }

    #[instrument(name = "agent_save_model", skip(self), fields(dir = %self.config.checkpoint_dir.display()))]
    fn save_model(&mut self, round_index: u32) -> Result<(), ContractError> {
        let ckpt = Checkpoint {
            round_index,
            epsilon: self.epsilon,
            train_steps: self.train_steps,
            value: self.value.clone(),
        };
        let path = checkpoint::save(&self.config.checkpoint_dir, &ckpt, &self.history)?;
        info!(round = round_index, path = %path.display(), "checkpoint saved");
        Ok(())
    }

    fn history(&self) -> &TrainingHistory {
        &self.history
    }

    fn record_round(&mut self, cumulative_reward: f64, length_sec: f64) {
        self.history.record(cumulative_reward, length_sec);
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        debug!(
            reward = cumulative_reward,
            length_sec,
            epsilon = self.epsilon,
            "round recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> AgentConfig {
        AgentConfig {
            seed: Some(7),
            min_replay: 4,
            batch_size: 4,
            checkpoint_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn experience(reward: f64) -> ExperienceTuple {
        ExperienceTuple {
            observation: Observation::default(),
            action: Action::default(),
            reward,
            next_observation: Observation::default(),
            done: false,
        }
    }

    #[test]
    fn test_train_waits_for_min_replay() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = ReplayAgent::new(config(dir.path()));
        for _ in 0..3 {
            agent.store_experience(experience(1.0));
            agent.train().unwrap();
        }
        assert_eq!(agent.train_steps(), 0);

        agent.store_experience(experience(1.0));
        agent.train().unwrap();
        assert_eq!(agent.train_steps(), 1);
        assert!(agent.last_loss().is_some());
    }

    #[test]
    fn test_zero_epsilon_is_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = ReplayAgent::new(AgentConfig {
            epsilon: 0.0,
            ..config(dir.path())
        });
        let obs = Observation::default();
        let a = agent.select_action(&obs);
        assert_eq!(a, heuristic_action(&obs, 8.0));
    }

    #[test]
    fn test_full_epsilon_actions_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = ReplayAgent::new(AgentConfig {
            epsilon: 1.0,
            ..config(dir.path())
        });
        for _ in 0..50 {
            let a = agent.select_action(&Observation::default());
            assert!((0.0..=1.0).contains(&a.throttle));
            assert!((-1.0..=1.0).contains(&a.steer));
        }
    }

    #[test]
    fn test_record_round_decays_epsilon() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = ReplayAgent::new(AgentConfig {
            epsilon: 0.02,
            epsilon_min: 0.01,
            epsilon_decay: 0.1,
            ..config(dir.path())
        });
        agent.record_round(5.0, 30.0);
        assert_eq!(agent.epsilon(), 0.01);
        assert_eq!(agent.history().episode_rewards, vec![5.0]);
        assert_eq!(agent.history().episode_lengths, vec![30.0]);
    }

    #[test]
    fn test_save_then_resume() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = ReplayAgent::new(config(dir.path()));
        for i in 0..8 {
            agent.store_experience(experience(i as f64));
        }
        agent.train().unwrap();
        agent.record_round(3.0, 10.0);
        agent.save_model(0).unwrap();

        let path = checkpoint::checkpoint_path(dir.path(), 0);
        let resumed = ReplayAgent::resume(config(dir.path()), &path).unwrap();
        for (a, b) in resumed.value().weights.iter().zip(agent.value().weights.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((resumed.epsilon() - agent.epsilon()).abs() < 1e-12);
        assert_eq!(resumed.history().rounds(), 1);
        assert!(resumed.replay().is_empty());
    }
}
