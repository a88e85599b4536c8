//! 测试用 agent：记录所有调用

use std::cell::RefCell;

use contracts::{
    Action, ContractError, ExperienceTuple, LearningAgent, Observation, RewardFlags,
    TrainingHistory,
};

#[derive(Debug, Default)]
pub struct RecordingAgent {
    pub experiences: Vec<ExperienceTuple>,
    pub actions_selected: u32,
    pub train_calls: u32,
    pub saved_rounds: Vec<u32>,
    pub fail_training: bool,
    pub history: TrainingHistory,
    /// calculate_reward 只拿到 &self
    pub(crate) reward_calls: RefCell<Vec<(f64, RewardFlags)>>,
}

impl RecordingAgent {
    pub const STEP_REWARD: f64 = 1.0;
    pub const COLLISION_REWARD: f64 = -100.0;
    pub const ACTION: Action = Action {
        throttle: 0.5,
        steer: 0.0,
        brake: 0.0,
    };

    pub fn reward_flags(&self) -> Vec<RewardFlags> {
        self.reward_calls.borrow().iter().map(|(_, f)| *f).collect()
    }

    /// 每次 calculate_reward 所用观测的时间戳
    pub fn rewarded_timestamps(&self) -> Vec<f64> {
        self.reward_calls.borrow().iter().map(|(t, _)| *t).collect()
    }
}

impl LearningAgent for RecordingAgent {
    fn select_action(&mut self, _observation: &Observation) -> Action {
        self.actions_selected += 1;
        Self::ACTION
    }

    fn calculate_reward(&self, observation: &Observation, flags: RewardFlags) -> f64 {
        self.reward_calls
            .borrow_mut()
            .push((observation.timestamp, flags));
        if flags.collision {
            Self::COLLISION_REWARD
        } else {
            Self::STEP_REWARD
        }
    }

    fn store_experience(&mut self, experience: ExperienceTuple) {
        self.experiences.push(experience);
    }

    fn train(&mut self) -> Result<(), ContractError> {
        self.train_calls += 1;
        if self.fail_training {
            Err(ContractError::agent("train", "injected failure"))
        } else {
            Ok(())
        }
    }

    fn save_model(&mut self, round_index: u32) -> Result<(), ContractError> {
        self.saved_rounds.push(round_index);
        Ok(())
    }

    fn history(&self) -> &TrainingHistory {
        &self.history
    }

    fn record_round(&mut self, cumulative_reward: f64, length_sec: f64) {
        self.history.record(cumulative_reward, length_sec);
    }
}
