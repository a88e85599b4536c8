//! # Scenario Runtime
//!
//! 回合制场景控制循环。
//!
//! - [`RoundStateMachine`]：轮次状态与计时
//! - [`RewardCoordinator`]：经验组装、碰撞去抖与训练触发
//! - [`ControlMediator`]：learned / autopilot 模式切换与控制下发
//! - [`ScenarioController`]：固定频率 tick 循环，串联以上部分

pub mod collision;
pub mod command;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod mediator;
pub mod state;
pub mod summary;

#[cfg(test)]
mod testing;

pub use collision::{collision_channel, CollisionDebouncer, CollisionInbox};
pub use command::OperatorCommand;
pub use controller::ScenarioController;
pub use coordinator::{CollisionOutcome, RewardCoordinator};
pub use error::{Result, ScenarioError};
pub use mediator::ControlMediator;
pub use state::{RoundPhase, RoundState, RoundStateMachine};
pub use summary::RunSummary;
