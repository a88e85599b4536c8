//! 操作员命令

use std::fmt;
use std::str::FromStr;

/// 运行期操作员命令，经通道送入控制循环
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// 立即 teardown 并退出
    Stop,
    /// 在 learned 与 autopilot 之间切换
    ToggleMode,
    /// 导出当前遥测快照
    SaveTelemetry,
}

impl FromStr for OperatorCommand {
    type Err = String;

    /// 接受完整命令名或单字母缩写 (`q`/`t`/`s`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q" | "quit" | "stop" | "exit" => Ok(Self::Stop),
            "t" | "toggle" => Ok(Self::ToggleMode),
            "s" | "save" => Ok(Self::SaveTelemetry),
            other => Err(format!("unknown command '{other}' (expected stop, toggle or save)")),
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stop => "stop",
            Self::ToggleMode => "toggle",
            Self::SaveTelemetry => "save",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("q".parse::<OperatorCommand>(), Ok(OperatorCommand::Stop));
        assert_eq!(" Toggle \n".parse::<OperatorCommand>(), Ok(OperatorCommand::ToggleMode));
        assert_eq!("save".parse::<OperatorCommand>(), Ok(OperatorCommand::SaveTelemetry));
        assert!("jump".parse::<OperatorCommand>().is_err());
    }
}
