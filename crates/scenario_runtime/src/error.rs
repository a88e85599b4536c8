//! Scenario runtime error types
//!
//! 只有致命的 setup 失败会向上传播；其余错误在控制循环内就地吸收。

use actor_factory::ActorFactoryError;
use thiserror::Error;

use crate::state::RoundPhase;

#[derive(Debug, Error)]
pub enum ScenarioError {
    /// 连接、加载地图或设置交通管理器失败
    #[error("world setup failed: {0}")]
    WorldSetup(#[source] ActorFactoryError),

    /// 引擎没有提供道路图
    #[error("engine did not provide a road map for '{map}'")]
    RoadMapUnavailable { map: String },

    /// 某一轮的 actors 无法生成，终止后续轮次
    #[error("round {round} setup failed: {source}")]
    RoundSetup {
        round: u32,
        #[source]
        source: ActorFactoryError,
    },

    /// 状态机收到非法的转移请求
    #[error("invalid round transition from {from:?} to {to:?}")]
    InvalidTransition { from: RoundPhase, to: RoundPhase },
}

impl ScenarioError {
    pub fn invalid_transition(from: RoundPhase, to: RoundPhase) -> Self {
        Self::InvalidTransition { from, to }
    }
}

pub type Result<T> = std::result::Result<T, ScenarioError>;
