//! LearningAgent trait - opaque learning strategy
//!
//! The scenario controller only talks to the agent through this capability
//! interface and never depends on its internals.

use serde::{Deserialize, Serialize};

use crate::{Action, ContractError, Observation};

/// Flags passed to the reward function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardFlags {
    pub collision: bool,
    pub off_road: bool,
}

/// One transition handed to the agent
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceTuple {
    pub observation: Observation,
    pub action: Action,
    pub reward: f64,
    pub next_observation: Observation,
    pub done: bool,
}

/// Per-round training record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub episode_rewards: Vec<f64>,
    /// Round length in seconds
    pub episode_lengths: Vec<f64>,
}

impl TrainingHistory {
    pub fn record(&mut self, reward: f64, length_sec: f64) {
        self.episode_rewards.push(reward);
        self.episode_lengths.push(length_sec);
    }

    pub fn rounds(&self) -> usize {
        self.episode_rewards.len()
    }
}

/// Learning agent capability interface
///
/// Called only from the tick loop thread, so no `Sync` bound.
pub trait LearningAgent: Send {
    /// Choose an action for the current observation
    fn select_action(&mut self, observation: &Observation) -> Action;

    /// Scalar reward for reaching `observation`
    fn calculate_reward(&self, observation: &Observation, flags: RewardFlags) -> f64;

    /// Take ownership of one transition
    fn store_experience(&mut self, experience: ExperienceTuple);

    /// Run one training step
    fn train(&mut self) -> Result<(), ContractError>;

    /// Persist a checkpoint tagged with the round index
    fn save_model(&mut self, round_index: u32) -> Result<(), ContractError>;

    /// Training history (per-round reward and length)
    fn history(&self) -> &TrainingHistory;

    /// Append one round to the training history
    fn record_round(&mut self, cumulative_reward: f64, length_sec: f64);
}
