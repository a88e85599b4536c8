//! 控制相关类型：执行器命令、控制模式、代理动作

use serde::{Deserialize, Serialize};

/// 引擎执行器控制量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// 油门 [0, 1]
    pub throttle: f32,
    /// 转向 [-1, 1]
    pub steer: f32,
    /// 刹车 [0, 1]
    pub brake: f32,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
    pub gear: i32,
}

impl Default for VehicleControl {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            steer: 0.0,
            brake: 0.0,
            hand_brake: false,
            reverse: false,
            manual_gear_shift: false,
            gear: 0,
        }
    }
}

/// 控制模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// 学习代理输出动作
    #[default]
    Learned,
    /// 引擎内置自动驾驶
    Autopilot,
}

impl ControlMode {
    /// 切换到另一模式
    pub fn toggled(self) -> Self {
        match self {
            Self::Learned => Self::Autopilot,
            Self::Autopilot => Self::Learned,
        }
    }

    pub fn is_learned(self) -> bool {
        matches!(self, Self::Learned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::Autopilot => "autopilot",
        }
    }
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 学习代理的动作表示
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
}

/// 单次控制决策，立即被执行器消费
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionCommand {
    pub control: VehicleControl,
    pub mode: ControlMode,
}
