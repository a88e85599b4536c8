//! 生成点文件解析
//!
//! 兼容生成点选取工具写出的 JSON：
//!
//! ```json
//! {
//!     "map_name": "Town03",
//!     "ego_point": { "x": 1.0, "y": 2.0, "z": 0.5, "yaw": 90.0 },
//!     "npc_points": [ { "x": 10.0, "y": 2.0, "z": 0.5, "yaw": 90.0 } ]
//! }
//! ```

use contracts::{ContractError, ScenarioConfig, SpawnPoint};
use serde::{Deserialize, Serialize};

/// 生成点文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPointFile {
    pub map_name: String,
    /// 主车生成点 (工具允许未选择，加载时必须存在)
    pub ego_point: Option<SpawnPoint>,
    #[serde(default)]
    pub npc_points: Vec<SpawnPoint>,
}

impl SpawnPointFile {
    /// 解析 JSON 内容
    pub fn parse(content: &str) -> Result<Self, ContractError> {
        serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
            message: format!("spawn point JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// 覆盖配置中的地图与生成点
    pub fn apply_to(&self, config: &mut ScenarioConfig) -> Result<(), ContractError> {
        let ego = self.ego_point.ok_or_else(|| {
            ContractError::config_validation("ego_point", "spawn point file has no ego point")
        })?;

        config.world.map = self.map_name.clone();
        config.ego.spawn_point = ego;
        config.npc.spawn_points = self.npc_points.clone();
        Ok(())
    }

    /// 以默认参数构造完整配置
    pub fn into_config(self) -> Result<ScenarioConfig, ContractError> {
        let ego = self.ego_point.ok_or_else(|| {
            ContractError::config_validation("ego_point", "spawn point file has no ego point")
        })?;
        let mut config = ScenarioConfig::with_ego(self.map_name, ego);
        config.npc.spawn_points = self.npc_points;
        Ok(config)
    }
}
