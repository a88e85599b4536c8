//! # Agent
//!
//! 默认学习代理实现：`ReplayAgent` 实现 `contracts::LearningAgent`。
//! 控制器只通过该 trait 调用，可替换为任意外部策略。

mod agent;
mod checkpoint;
mod config;
mod policy;
mod replay;
mod reward;
mod value;

pub use agent::ReplayAgent;
pub use checkpoint::{checkpoint_path, Checkpoint, HISTORY_FILE};
pub use config::{AgentConfig, RewardWeights};
pub use policy::heuristic_action;
pub use replay::ReplayBuffer;
pub use reward::shaped_reward;
pub use value::LinearValue;
