//! Mock 仿真客户端
//!
//! 用于单元测试与离线运行的 mock 实现，支持注入失败场景。
//! 车辆按简单运动学积分前进，道路由 [`MockRoad`] 提供。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{
    ActorId, CollisionEvent, CollisionSensor, EgoState, EngineSnapshot, Location, RoadMap,
    TrafficLightInfo, TrafficManagerConfig, Transform, Vector3, VehicleControl, VehicleState,
    WeatherState,
};
use tracing::{debug, instrument};

use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_road::MockRoad;
use crate::mock_sensor::MockCollisionSensor;

/// 最高车速 (m/s)
const MAX_SPEED: f64 = 30.0;
/// 满油门加速度 (m/s²)
const THROTTLE_ACCEL: f64 = 4.0;
/// 满刹车减速度 (m/s²)
const BRAKE_DECEL: f64 = 8.0;
/// 满舵转向角速度 (度/秒)
const STEER_RATE_DEG: f64 = 45.0;
/// 自动驾驶巡航油门
const AUTOPILOT_THROTTLE: f32 = 0.4;

/// Mock 客户端配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 当前加载的地图名
    pub map_name: String,
    /// 前 N 次主车 spawn 失败
    pub ego_spawn_failures: u32,
    /// 这些蓝图的 spawn 总是失败
    pub fail_blueprints: Vec<String>,
    /// 碰撞传感器 spawn 失败
    pub fail_sensor: bool,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
    /// 前 N 次快照查询失败
    pub fail_snapshots: u32,
    /// 快照查询延迟
    pub snapshot_latency: Option<Duration>,
    /// 每次查询/控制推进的仿真时间 (秒)
    pub step_dt: f64,
    pub road: MockRoad,
    /// 场景中额外存在的静止车辆
    pub static_vehicles: Vec<VehicleState>,
    pub traffic_lights: Vec<TrafficLightInfo>,
    pub weather: WeatherState,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            map_name: "Town03".to_string(),
            ego_spawn_failures: 0,
            fail_blueprints: Vec::new(),
            fail_sensor: false,
            fail_destroy: Vec::new(),
            fail_snapshots: 0,
            snapshot_latency: None,
            step_dt: 1.0 / 60.0,
            road: MockRoad::default(),
            static_vehicles: Vec::new(),
            traffic_lights: Vec::new(),
            weather: WeatherState::default(),
        }
    }
}

/// 客户端调用记录，用于断言调用顺序
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Connected,
    MapLoaded(String),
    TrafficManagerConfigured,
    Spawned { actor_id: ActorId, blueprint: String },
    Destroyed(ActorId),
    AutopilotSet { actor_id: ActorId, enabled: bool },
    ControlApplied(ActorId),
}

#[derive(Debug, Clone)]
struct MockVehicle {
    blueprint: String,
    transform: Transform,
    velocity: Vector3,
    acceleration: Vector3,
    angular_velocity: Vector3,
    control: VehicleControl,
    autopilot: bool,
}

impl MockVehicle {
    fn new(blueprint: &str, transform: Transform) -> Self {
        Self {
            blueprint: blueprint.to_string(),
            transform,
            velocity: Vector3::default(),
            acceleration: Vector3::default(),
            angular_velocity: Vector3::default(),
            control: VehicleControl::default(),
            autopilot: false,
        }
    }

    /// 按控制量积分一步
    fn integrate(&mut self, control: VehicleControl, dt: f64) {
        let speed = self.velocity.length();
        let accel = control.throttle as f64 * THROTTLE_ACCEL - control.brake as f64 * BRAKE_DECEL;
        let new_speed = (speed + accel * dt).clamp(0.0, MAX_SPEED);

        let yaw_rate = if new_speed > 0.1 {
            control.steer as f64 * STEER_RATE_DEG
        } else {
            0.0
        };
        self.transform.rotation.yaw += yaw_rate * dt;

        let forward = self.transform.forward_vector();
        self.velocity = Vector3::new(forward.x * new_speed, forward.y * new_speed, 0.0);
        let dv = (new_speed - speed) / dt;
        self.acceleration = Vector3::new(forward.x * dv, forward.y * dv, 0.0);
        self.angular_velocity = Vector3::new(0.0, 0.0, yaw_rate);
        self.transform.location.x += self.velocity.x * dt;
        self.transform.location.y += self.velocity.y * dt;
        self.control = control;
    }

    /// 车轮位置 (前左、前右、后左、后右)
    fn wheel_positions(&self) -> Vec<Location> {
        let f = self.transform.forward_vector();
        let loc = self.transform.location;
        let (right_x, right_y) = (-f.y, f.x);
        [(1.4, -0.8), (1.4, 0.8), (-1.4, -0.8), (-1.4, 0.8)]
            .iter()
            .map(|(lon, lat)| {
                Location::new(
                    loc.x + f.x * lon + right_x * lat,
                    loc.y + f.y * lon + right_y * lat,
                    loc.z,
                )
            })
            .collect()
    }
}

enum MockActor {
    Vehicle(MockVehicle),
    CollisionSensor {
        parent_id: ActorId,
        sensor: MockCollisionSensor,
    },
}

struct MockState {
    connected: bool,
    map_name: String,
    next_actor_id: ActorId,
    actors: HashMap<ActorId, MockActor>,
    ego_spawn_attempts: u32,
    snapshot_calls: u32,
    sim_time: f64,
    traffic_manager: Option<TrafficManagerConfig>,
    events: Vec<MockEvent>,
}

/// Mock 仿真客户端
///
/// Clone 共享同一份世界状态，测试可以保留一个副本用于检查。
#[derive(Clone)]
pub struct MockSimClient {
    /// 配置（可注入失败场景）
    config: Arc<MockConfig>,
    state: Arc<Mutex<MockState>>,
}

impl MockSimClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        let state = MockState {
            connected: false,
            map_name: config.map_name.clone(),
            next_actor_id: 1000, // 从 1000 开始，便于识别
            actors: HashMap::new(),
            ego_spawn_attempts: 0,
            snapshot_calls: 0,
            sim_time: 0.0,
            traffic_manager: None,
            events: Vec::new(),
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// 获取当前存活的 actor 数量
    pub fn actor_count(&self) -> usize {
        self.state.lock().unwrap().actors.len()
    }

    /// 获取所有存活的 actor IDs
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<_> = self.state.lock().unwrap().actors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// 调用记录副本
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// 主车 spawn 尝试次数
    pub fn ego_spawn_attempts(&self) -> u32 {
        self.state.lock().unwrap().ego_spawn_attempts
    }

    /// 最近一次生效的交通管理器参数
    pub fn traffic_manager(&self) -> Option<TrafficManagerConfig> {
        self.state.lock().unwrap().traffic_manager.clone()
    }

    /// 车辆当前位姿
    pub fn vehicle_transform(&self, actor_id: ActorId) -> Option<Transform> {
        match self.state.lock().unwrap().actors.get(&actor_id) {
            Some(MockActor::Vehicle(v)) => Some(v.transform),
            _ => None,
        }
    }

    /// 车辆最近一次收到的控制量
    pub fn vehicle_control(&self, actor_id: ActorId) -> Option<VehicleControl> {
        match self.state.lock().unwrap().actors.get(&actor_id) {
            Some(MockActor::Vehicle(v)) => Some(v.control),
            _ => None,
        }
    }

    /// 车辆是否由自动驾驶接管
    pub fn is_autopilot(&self, actor_id: ActorId) -> Option<bool> {
        match self.state.lock().unwrap().actors.get(&actor_id) {
            Some(MockActor::Vehicle(v)) => Some(v.autopilot),
            _ => None,
        }
    }

    /// 直接设置车辆位姿 (例如把主车移出路面)
    pub fn teleport(&self, actor_id: ActorId, transform: Transform) -> bool {
        match self.state.lock().unwrap().actors.get_mut(&actor_id) {
            Some(MockActor::Vehicle(v)) => {
                v.transform = transform;
                true
            }
            _ => false,
        }
    }

    /// 挂在 `parent_id` 上的碰撞传感器
    pub fn sensor_for(&self, parent_id: ActorId) -> Option<MockCollisionSensor> {
        self.state
            .lock()
            .unwrap()
            .actors
            .values()
            .find_map(|actor| match actor {
                MockActor::CollisionSensor {
                    parent_id: p,
                    sensor,
                } if *p == parent_id => Some(sensor.clone()),
                _ => None,
            })
    }

    /// 模拟 `parent_id` 与 `other_actor_id` 发生碰撞
    ///
    /// 返回事件是否被送达监听回调。
    pub fn trigger_collision(
        &self,
        parent_id: ActorId,
        other_actor_id: ActorId,
        normal_impulse: Vector3,
    ) -> bool {
        let timestamp = self.state.lock().unwrap().sim_time;
        match self.sensor_for(parent_id) {
            Some(sensor) => sensor.emit(CollisionEvent {
                timestamp,
                other_actor_id,
                normal_impulse,
            }),
            None => false,
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.state.lock().unwrap().connected {
            Ok(())
        } else {
            Err(ActorFactoryError::ConnectionFailed {
                message: "not connected".into(),
            })
        }
    }

    fn allocate(state: &mut MockState, actor: MockActor, blueprint: &str) -> ActorId {
        let actor_id = state.next_actor_id;
        state.next_actor_id += 1;
        state.actors.insert(actor_id, actor);
        state.events.push(MockEvent::Spawned {
            actor_id,
            blueprint: blueprint.to_string(),
        });
        actor_id
    }

    fn with_vehicle<R>(
        &self,
        actor_id: ActorId,
        operation: &str,
        f: impl FnOnce(&mut MockVehicle) -> R,
    ) -> Result<R> {
        let mut state = self.state.lock().unwrap();
        match state.actors.get_mut(&actor_id) {
            Some(MockActor::Vehicle(v)) => Ok(f(v)),
            _ => Err(ActorFactoryError::actor_command(
                actor_id,
                operation,
                "vehicle not found",
            )),
        }
    }

    /// 推进仿真时间并生成快照
    fn snapshot_now(&self, ego_id: ActorId) -> Result<EngineSnapshot> {
        let dt = self.config.step_dt;
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(ActorFactoryError::ConnectionFailed {
                message: "not connected".into(),
            });
        }

        state.snapshot_calls += 1;
        if state.snapshot_calls <= self.config.fail_snapshots {
            return Err(ActorFactoryError::query("snapshot", "mock failure"));
        }
        state.sim_time += dt;

        for actor in state.actors.values_mut() {
            if let MockActor::Vehicle(v) = actor {
                if v.autopilot {
                    let control = VehicleControl {
                        throttle: AUTOPILOT_THROTTLE,
                        ..Default::default()
                    };
                    v.integrate(control, dt);
                }
            }
        }

        let ego = match state.actors.get(&ego_id) {
            Some(MockActor::Vehicle(v)) => EgoState {
                actor_id: ego_id,
                transform: v.transform,
                velocity: v.velocity,
                acceleration: v.acceleration,
                angular_velocity: v.angular_velocity,
                control: v.control,
                wheel_positions: v.wheel_positions(),
            },
            _ => {
                return Err(ActorFactoryError::query(
                    "snapshot",
                    format!("ego actor {ego_id} not found"),
                ))
            }
        };

        let mut vehicles: Vec<VehicleState> = state
            .actors
            .iter()
            .filter(|(id, _)| **id != ego_id)
            .filter_map(|(id, actor)| match actor {
                MockActor::Vehicle(v) => Some(VehicleState {
                    actor_id: *id,
                    location: v.transform.location,
                    velocity: v.velocity,
                }),
                _ => None,
            })
            .collect();
        vehicles.sort_by_key(|v| v.actor_id);
        vehicles.extend(self.config.static_vehicles.iter().copied());

        Ok(EngineSnapshot {
            timestamp: state.sim_time,
            ego,
            vehicles,
            traffic_lights: self.config.traffic_lights.clone(),
            weather: self.config.weather,
        })
    }
}

impl Default for MockSimClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClient for MockSimClient {
    #[instrument(name = "mock_sim_connect", skip(self, _timeout), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, _timeout: Duration) -> Result<()> {
        let _ = (host, port);
        let mut state = self.state.lock().unwrap();
        state.connected = true;
        state.events.push(MockEvent::Connected);
        Ok(())
    }

    async fn map_name(&self) -> Result<String> {
        self.ensure_connected()?;
        Ok(self.state.lock().unwrap().map_name.clone())
    }

    #[instrument(name = "mock_sim_load_map", skip(self), fields(map = %map))]
    async fn load_map(&self, map: &str) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.lock().unwrap();
        for actor in state.actors.values() {
            if let MockActor::CollisionSensor { sensor, .. } = actor {
                sensor.stop();
            }
        }
        state.actors.clear();
        state.map_name = map.to_string();
        state.events.push(MockEvent::MapLoaded(map.to_string()));
        Ok(())
    }

    async fn configure_traffic_manager(&self, config: &TrafficManagerConfig) -> Result<()> {
        self.ensure_connected()?;
        let mut state = self.state.lock().unwrap();
        state.traffic_manager = Some(config.clone());
        state.events.push(MockEvent::TrafficManagerConfigured);
        Ok(())
    }

    #[instrument(
        name = "mock_sim_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint, role_name = ?role_name)
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: Option<&str>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;
        let mut state = self.state.lock().unwrap();

        if role_name.is_some() {
            state.ego_spawn_attempts += 1;
            if state.ego_spawn_attempts <= self.config.ego_spawn_failures {
                return Err(ActorFactoryError::vehicle_spawn(
                    blueprint,
                    "mock failure: spawn point occupied",
                ));
            }
        }
        if self.config.fail_blueprints.iter().any(|b| b == blueprint) {
            return Err(ActorFactoryError::vehicle_spawn(blueprint, "mock failure"));
        }

        let actor_id = Self::allocate(
            &mut state,
            MockActor::Vehicle(MockVehicle::new(blueprint, transform)),
            blueprint,
        );
        debug!(actor_id, "mock vehicle spawned");
        Ok(actor_id)
    }

    #[instrument(name = "mock_sim_spawn_collision_sensor", skip(self), fields(parent_id))]
    async fn spawn_collision_sensor(&self, parent_id: ActorId) -> Result<ActorId> {
        self.ensure_connected()?;
        let mut state = self.state.lock().unwrap();

        // 验证 parent 存在
        if !matches!(state.actors.get(&parent_id), Some(MockActor::Vehicle(_))) {
            return Err(ActorFactoryError::sensor_spawn(
                "collision",
                format!("actor_{parent_id}"),
                "parent actor not found",
            ));
        }
        if self.config.fail_sensor {
            return Err(ActorFactoryError::sensor_spawn(
                "collision",
                format!("actor_{parent_id}"),
                "mock failure",
            ));
        }

        let actor_id = state.next_actor_id;
        let sensor = MockCollisionSensor::new(actor_id);
        Ok(Self::allocate(
            &mut state,
            MockActor::CollisionSensor { parent_id, sensor },
            "sensor.other.collision",
        ))
    }

    #[instrument(name = "mock_sim_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        let mut state = self.state.lock().unwrap();
        if let Some(actor) = state.actors.remove(&actor_id) {
            if let MockActor::CollisionSensor { sensor, .. } = actor {
                sensor.stop();
            }
            state.events.push(MockEvent::Destroyed(actor_id));
        }
        Ok(())
    }

    async fn set_autopilot(&self, actor_id: ActorId, enabled: bool) -> Result<()> {
        self.with_vehicle(actor_id, "set_autopilot", |v| v.autopilot = enabled)?;
        self.state
            .lock()
            .unwrap()
            .events
            .push(MockEvent::AutopilotSet { actor_id, enabled });
        Ok(())
    }

    async fn apply_control(&self, actor_id: ActorId, control: VehicleControl) -> Result<()> {
        let dt = self.config.step_dt;
        self.with_vehicle(actor_id, "apply_control", |v| {
            if !v.autopilot {
                v.integrate(control, dt);
            }
        })?;
        self.state
            .lock()
            .unwrap()
            .events
            .push(MockEvent::ControlApplied(actor_id));
        Ok(())
    }

    async fn snapshot(&self, ego_id: ActorId) -> Result<EngineSnapshot> {
        if let Some(latency) = self.config.snapshot_latency {
            tokio::time::sleep(latency).await;
        }
        self.snapshot_now(ego_id)
    }

    fn road_map(&self) -> Option<Arc<dyn RoadMap>> {
        if self.state.lock().unwrap().connected {
            Some(Arc::new(self.config.road))
        } else {
            None
        }
    }

    fn collision_sensor(&self, actor_id: ActorId) -> Option<Box<dyn CollisionSensor>> {
        match self.state.lock().unwrap().actors.get(&actor_id) {
            Some(MockActor::CollisionSensor { sensor, .. }) => Some(Box::new(sensor.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Rotation;

    fn origin() -> Transform {
        Transform::new(Location::new(0.0, 0.0, 0.5), Rotation::default())
    }

    async fn connected(config: MockConfig) -> MockSimClient {
        let mut client = MockSimClient::with_config(config);
        client
            .connect("localhost", 2000, Duration::from_secs(1))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_mock_spawn_vehicle() {
        let client = connected(MockConfig::default()).await;
        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .unwrap();
        assert!(actor_id >= 1000);
        assert_eq!(client.actor_count(), 1);
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let client = MockSimClient::new();
        let result = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), None)
            .await;
        assert!(matches!(
            result,
            Err(ActorFactoryError::ConnectionFailed { .. })
        ));
        assert!(client.road_map().is_none());
    }

    #[tokio::test]
    async fn test_mock_spawn_sensor() {
        let client = connected(MockConfig::default()).await;
        let vehicle_id = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .unwrap();
        let sensor_id = client.spawn_collision_sensor(vehicle_id).await.unwrap();

        assert!(sensor_id > vehicle_id);
        assert_eq!(client.actor_count(), 2);
        assert!(client.collision_sensor(sensor_id).is_some());
        assert!(client.collision_sensor(vehicle_id).is_none());
    }

    #[tokio::test]
    async fn test_mock_destroy_idempotent() {
        let client = connected(MockConfig::default()).await;
        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), None)
            .await
            .unwrap();
        client.destroy_actor(actor_id).await.unwrap();
        // Second destroy should also succeed
        client.destroy_actor(actor_id).await.unwrap();
        assert_eq!(client.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_ego_spawn_failures_counted() {
        let client = connected(MockConfig {
            ego_spawn_failures: 2,
            ..Default::default()
        })
        .await;
        for _ in 0..2 {
            assert!(client
                .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
                .await
                .is_err());
        }
        assert!(client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .is_ok());
        assert_eq!(client.ego_spawn_attempts(), 3);
    }

    #[tokio::test]
    async fn test_throttle_moves_vehicle_forward() {
        let client = connected(MockConfig::default()).await;
        let id = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .unwrap();

        let control = VehicleControl {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..60 {
            client.apply_control(id, control).await.unwrap();
        }

        let snapshot = client.snapshot(id).await.unwrap();
        assert!(snapshot.ego.speed() > 3.0);
        assert!(snapshot.ego.transform.location.x > 1.0);
        assert_eq!(snapshot.ego.wheel_positions.len(), 4);
        assert_eq!(snapshot.ego.control.throttle, 1.0);
    }

    #[tokio::test]
    async fn test_snapshot_lists_other_vehicles() {
        let client = connected(MockConfig::default()).await;
        let ego = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .unwrap();
        let npc_transform = Transform::new(Location::new(20.0, 0.0, 0.5), Rotation::default());
        let npc = client
            .spawn_vehicle("vehicle.audi.a2", npc_transform, None)
            .await
            .unwrap();

        let snapshot = client.snapshot(ego).await.unwrap();
        assert_eq!(snapshot.vehicles.len(), 1);
        assert_eq!(snapshot.vehicles[0].actor_id, npc);
        assert!(snapshot.timestamp > 0.0);
    }

    #[tokio::test]
    async fn test_trigger_collision_reaches_listener() {
        let client = connected(MockConfig::default()).await;
        let ego = client
            .spawn_vehicle("vehicle.tesla.model3", origin(), Some("ego"))
            .await
            .unwrap();
        let sensor_id = client.spawn_collision_sensor(ego).await.unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        client
            .collision_sensor(sensor_id)
            .unwrap()
            .listen(Arc::new(move |e| sink.lock().unwrap().push(e)));

        assert!(client.trigger_collision(ego, 42, Vector3::new(500.0, 0.0, 0.0)));
        assert_eq!(received.lock().unwrap()[0].other_actor_id, 42);

        // 销毁后不再送达
        client.destroy_actor(sensor_id).await.unwrap();
        assert!(!client.trigger_collision(ego, 42, Vector3::default()));
    }

    #[tokio::test]
    async fn test_load_map_clears_actors() {
        let client = connected(MockConfig::default()).await;
        client
            .spawn_vehicle("vehicle.tesla.model3", origin(), None)
            .await
            .unwrap();
        client.load_map("Town05").await.unwrap();
        assert_eq!(client.actor_count(), 0);
        assert_eq!(client.map_name().await.unwrap(), "Town05");
    }
}
