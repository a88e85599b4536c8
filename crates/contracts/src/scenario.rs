//! ScenarioConfig - Config Loader 输出
//!
//! 描述完整的场景配置：地图、主车与 NPC 生成点、轮次策略、生命周期时序、
//! 交通管理器参数、编码器常量、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

use crate::{ControlMode, EncoderConfig, Location, Rotation, Transform};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的场景配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScenarioConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 世界设置
    #[validate(nested)]
    pub world: WorldConfig,

    /// 主车
    #[validate(nested)]
    pub ego: EgoConfig,

    /// 背景车辆
    #[serde(default)]
    #[validate(nested)]
    pub npc: NpcConfig,

    /// 轮次策略
    #[serde(default)]
    #[validate(nested)]
    pub rounds: RoundConfig,

    /// Actor 生命周期时序
    #[serde(default)]
    #[validate(nested)]
    pub lifecycle: LifecycleConfig,

    /// 交通管理器参数
    #[serde(default)]
    #[validate(nested)]
    pub traffic_manager: TrafficManagerConfig,

    /// 观测编码常量
    #[serde(default)]
    #[validate(nested)]
    pub encoder: EncoderConfig,

    /// 输出路由
    #[serde(default)]
    pub output: OutputConfig,
}

/// 世界配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorldConfig {
    /// 地图名称 (e.g., "Town03")
    #[validate(length(min = 1))]
    pub map: String,

    /// 仿真服务器地址
    #[serde(default = "default_carla_host")]
    pub carla_host: String,

    /// 仿真服务器端口
    #[serde(default = "default_carla_port")]
    pub carla_port: u16,

    /// 客户端 RPC 超时 (秒)
    #[serde(default = "default_client_timeout")]
    #[validate(range(min = 0.1, max = 600.0))]
    pub client_timeout_sec: f64,
}

fn default_carla_host() -> String {
    "localhost".to_string()
}

fn default_carla_port() -> u16 {
    2000
}

fn default_client_timeout() -> f64 {
    10.0
}

/// 生成点：位置 + 航向 (spawn_points.json 格式)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f64,
}

impl SpawnPoint {
    pub fn to_transform(self) -> Transform {
        Transform {
            location: Location {
                x: self.x,
                y: self.y,
                z: self.z,
            },
            rotation: Rotation::from_yaw(self.yaw),
        }
    }
}

/// 主车配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EgoConfig {
    /// 蓝图名称
    #[serde(default = "default_ego_blueprint")]
    #[validate(length(min = 1))]
    pub blueprint: String,

    /// role_name 属性
    #[serde(default = "default_role_name")]
    pub role_name: String,

    /// 生成位姿
    pub spawn_point: SpawnPoint,
}

fn default_ego_blueprint() -> String {
    "vehicle.tesla.model3".to_string()
}

fn default_role_name() -> String {
    "ego".to_string()
}

/// NPC 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NpcConfig {
    /// 蓝图列表，按生成点循环使用；为空时使用默认车型
    #[serde(default)]
    pub blueprints: Vec<String>,

    /// 生成位姿列表
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
}

impl NpcConfig {
    /// 第 `index` 个生成点使用的蓝图
    pub fn blueprint_for(&self, index: usize) -> &str {
        if self.blueprints.is_empty() {
            "vehicle.audi.a2"
        } else {
            &self.blueprints[index % self.blueprints.len()]
        }
    }
}

/// 轮次策略
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoundConfig {
    /// 单轮时长 (秒)
    #[serde(default = "default_round_duration")]
    #[validate(range(min = 0.1))]
    pub round_duration_sec: f64,

    /// 最大轮数
    #[serde(default = "default_max_rounds")]
    #[validate(range(min = 1))]
    pub max_rounds: u32,

    /// 主循环频率 (Hz)
    #[serde(default = "default_tick_hz")]
    #[validate(range(min = 1.0, max = 1000.0))]
    pub tick_hz: f64,

    /// 碰撞去抖窗口 (秒)
    #[serde(default = "default_collision_cooldown")]
    #[validate(range(min = 0.0))]
    pub collision_cooldown_sec: f64,

    /// 启动时控制模式
    #[serde(default)]
    pub initial_mode: ControlMode,

    /// 低于该高度视为驶离路面
    #[serde(default)]
    pub off_road_altitude: f64,
}

fn default_round_duration() -> f64 {
    30.0
}

fn default_max_rounds() -> u32 {
    10
}

fn default_tick_hz() -> f64 {
    60.0
}

fn default_collision_cooldown() -> f64 {
    1.0
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_duration_sec: default_round_duration(),
            max_rounds: default_max_rounds(),
            tick_hz: default_tick_hz(),
            collision_cooldown_sec: default_collision_cooldown(),
            initial_mode: ControlMode::default(),
            off_road_altitude: 0.0,
        }
    }
}

/// Actor 生命周期时序
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LifecycleConfig {
    /// 主车生成尝试次数
    #[serde(default = "default_ego_spawn_attempts")]
    #[validate(range(min = 1, max = 100))]
    pub ego_spawn_attempts: u32,

    /// 重试间隔 (毫秒)
    #[serde(default = "default_spawn_backoff_ms")]
    pub spawn_backoff_ms: u64,

    /// 主车生成后、NPC 生成前的等待 (毫秒)
    #[serde(default = "default_post_spawn_delay_ms")]
    pub post_spawn_delay_ms: u64,

    /// 销毁后等待引擎注册表收敛 (毫秒)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// 稳态查询超时 (毫秒)
    #[serde(default = "default_query_timeout_ms")]
    #[validate(range(min = 1))]
    pub query_timeout_ms: u64,
}

fn default_ego_spawn_attempts() -> u32 {
    3
}

fn default_spawn_backoff_ms() -> u64 {
    500
}

fn default_post_spawn_delay_ms() -> u64 {
    200
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_query_timeout_ms() -> u64 {
    100
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            ego_spawn_attempts: default_ego_spawn_attempts(),
            spawn_backoff_ms: default_spawn_backoff_ms(),
            post_spawn_delay_ms: default_post_spawn_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

/// 交通管理器参数
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrafficManagerConfig {
    #[serde(default = "default_tm_port")]
    pub port: u16,

    /// 与前车的全局跟车距离 (米)
    #[serde(default = "default_leading_distance")]
    #[validate(range(min = 0.0))]
    pub distance_to_leading_vehicle: f64,

    /// 全局限速差百分比 (负值表示超速)
    #[serde(default = "default_speed_difference")]
    #[validate(range(min = -100.0, max = 100.0))]
    pub global_speed_difference: f64,
}

fn default_tm_port() -> u16 {
    8000
}

fn default_leading_distance() -> f64 {
    0.5
}

fn default_speed_difference() -> f64 {
    -30.0
}

impl Default for TrafficManagerConfig {
    fn default() -> Self {
        Self {
            port: default_tm_port(),
            distance_to_leading_vehicle: default_leading_distance(),
            global_speed_difference: default_speed_difference(),
        }
    }
}

/// 输出路由
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录；为空时按时间戳生成
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// 遥测 sinks
    #[serde(default)]
    pub telemetry_sinks: Vec<TelemetrySinkConfig>,
}

/// 遥测 sink 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: TelemetrySinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    256
}

/// 遥测 sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetrySinkType {
    /// 日志输出
    Log,
    /// JSON Lines 文件输出
    File,
}

impl ScenarioConfig {
    /// 以给定地图与主车生成点构造默认配置
    pub fn with_ego(map: impl Into<String>, ego_point: SpawnPoint) -> Self {
        Self {
            version: ConfigVersion::V1,
            world: WorldConfig {
                map: map.into(),
                carla_host: default_carla_host(),
                carla_port: default_carla_port(),
                client_timeout_sec: default_client_timeout(),
            },
            ego: EgoConfig {
                blueprint: default_ego_blueprint(),
                role_name: default_role_name(),
                spawn_point: ego_point,
            },
            npc: NpcConfig::default(),
            rounds: RoundConfig::default(),
            lifecycle: LifecycleConfig::default(),
            traffic_manager: TrafficManagerConfig::default(),
            encoder: EncoderConfig::default(),
            output: OutputConfig::default(),
        }
    }
}
