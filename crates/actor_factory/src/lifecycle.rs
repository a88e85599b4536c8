//! Actor 生命周期管理
//!
//! 每轮 spawn 主车、碰撞传感器与背景车辆，轮末按固定顺序销毁。
//!
//! # 顺序保证
//! - 销毁传感器之前先停止监听，`teardown_round` 返回后不会再有碰撞回调
//! - 传感器先于主车销毁，主车先于背景车辆销毁
//! - 单个 actor 销毁失败只记录日志，不中断其余销毁

use std::time::Duration;

use contracts::{
    ActorId, AmbientActor, CollisionCallback, CollisionSensor, ControlMode, EgoActor,
    LifecycleConfig, RoundActors, ScenarioConfig, SensorHandle, TrafficManagerConfig, Transform,
    WorldConfig,
};
use tracing::{debug, error, info, instrument, warn};

use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};

/// 一轮需要 spawn 的内容
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnConfig {
    pub ego_blueprint: String,
    pub role_name: String,
    pub ego_transform: Transform,
    /// 主车初始是否交给自动驾驶
    pub ego_autopilot: bool,
    /// (蓝图, 位姿)
    pub ambient: Vec<(String, Transform)>,
}

impl SpawnConfig {
    /// 从场景配置构造，`mode` 决定主车初始是否由自动驾驶控制
    pub fn from_scenario(config: &ScenarioConfig, mode: ControlMode) -> Self {
        let ambient = config
            .npc
            .spawn_points
            .iter()
            .enumerate()
            .map(|(i, p)| (config.npc.blueprint_for(i).to_string(), p.to_transform()))
            .collect();
        Self {
            ego_blueprint: config.ego.blueprint.clone(),
            role_name: config.ego.role_name.clone(),
            ego_transform: config.ego.spawn_point.to_transform(),
            ego_autopilot: !mode.is_learned(),
            ambient,
        }
    }
}

/// 销毁结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// 成功销毁的 actor 数
    pub destroyed: usize,
    /// 销毁失败的 actor
    pub failed: Vec<ActorId>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 存活的一轮
struct LiveRound {
    actors: RoundActors,
    sensor: Box<dyn CollisionSensor>,
}

/// Actor 生命周期管理器
///
/// 同一时刻最多持有一轮存活的 actors。
pub struct ActorLifecycleManager<C: SimClient> {
    client: C,
    config: LifecycleConfig,
    live: Option<LiveRound>,
}

impl<C: SimClient> ActorLifecycleManager<C> {
    /// 创建新的管理器
    pub fn new(client: C, config: LifecycleConfig) -> Self {
        Self {
            client,
            config,
            live: None,
        }
    }

    /// 底层客户端
    pub fn client(&self) -> &C {
        &self.client
    }

    /// 当前存活的 actors
    pub fn actors(&self) -> Option<&RoundActors> {
        self.live.as_ref().map(|live| &live.actors)
    }

    pub fn is_round_live(&self) -> bool {
        self.live.is_some()
    }

    /// 连接引擎、确保地图正确并设置交通管理器
    #[instrument(
        name = "lifecycle_prepare_world",
        skip(self, world, traffic_manager),
        fields(map = %world.map, host = %world.carla_host, port = world.carla_port)
    )]
    pub async fn prepare_world(
        &mut self,
        world: &WorldConfig,
        traffic_manager: &TrafficManagerConfig,
    ) -> Result<()> {
        self.client
            .connect(
                &world.carla_host,
                world.carla_port,
                Duration::from_secs_f64(world.client_timeout_sec),
            )
            .await?;

        let current = self.client.map_name().await?;
        if !map_matches(&current, &world.map) {
            info!(current = %current, wanted = %world.map, "loading map");
            self.client.load_map(&world.map).await?;
        }

        self.client
            .configure_traffic_manager(traffic_manager)
            .await?;
        info!("world prepared");
        Ok(())
    }

    /// Spawn 一轮的全部 actors
    ///
    /// 主车按配置次数重试；碰撞传感器失败时销毁主车并返回错误；
    /// 背景车辆 spawn 失败只跳过。
    #[instrument(
        name = "lifecycle_spawn_round",
        skip(self, spawn, on_collision),
        fields(ambient = spawn.ambient.len(), ego_autopilot = spawn.ego_autopilot)
    )]
    pub async fn spawn_round(
        &mut self,
        spawn: &SpawnConfig,
        on_collision: CollisionCallback,
    ) -> Result<RoundActors> {
        if let Some(live) = &self.live {
            return Err(ActorFactoryError::RoundActive {
                ego_id: live.actors.ego.actor_id,
            });
        }

        let ego_id = self.spawn_ego_with_retry(spawn).await?;

        let (sensor_id, sensor) = match self.attach_collision_sensor(ego_id).await {
            Ok(attached) => attached,
            Err(e) => {
                warn!(error = %e, ego_id, "collision sensor failed, destroying ego");
                self.destroy_actor_safe(ego_id, "ego").await;
                return Err(e);
            }
        };
        sensor.listen(on_collision);

        if spawn.ego_autopilot {
            if let Err(e) = self.client.set_autopilot(ego_id, true).await {
                warn!(error = %e, ego_id, "failed to enable ego autopilot");
            }
        }

        self.pause(self.config.post_spawn_delay_ms).await;

        let ambient = self.spawn_ambient(&spawn.ambient).await;
        if !ambient.is_empty() {
            self.pause(self.config.post_spawn_delay_ms).await;
        }

        let actors = RoundActors {
            ego: EgoActor {
                actor_id: ego_id,
                spawn_transform: spawn.ego_transform,
                autopilot: spawn.ego_autopilot,
            },
            sensor: SensorHandle {
                actor_id: sensor_id,
                parent_id: ego_id,
            },
            ambient,
        };

        info!(
            ego_id,
            sensor_id,
            ambient = actors.ambient.len(),
            "round actors spawned"
        );
        self.live = Some(LiveRound {
            actors: actors.clone(),
            sensor,
        });
        Ok(actors)
    }

    /// 销毁当前轮的全部 actors
    ///
    /// # 幂等性
    /// 没有存活轮次时直接返回空报告。
    #[instrument(name = "lifecycle_teardown_round", skip(self))]
    pub async fn teardown_round(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        let Some(live) = self.live.take() else {
            return report;
        };
        info!("starting teardown");

        // 先停止监听，再销毁传感器
        live.sensor.stop();
        self.destroy_into(&mut report, live.actors.sensor.actor_id, "collision_sensor")
            .await;
        self.pause(self.config.settle_delay_ms).await;

        let ego_id = live.actors.ego.actor_id;
        self.release_autopilot(ego_id).await;
        self.destroy_into(&mut report, ego_id, "ego").await;

        for ambient in &live.actors.ambient {
            self.release_autopilot(ambient.actor_id).await;
            self.destroy_into(&mut report, ambient.actor_id, "ambient")
                .await;
        }
        self.pause(self.config.settle_delay_ms).await;

        info!(
            destroyed = report.destroyed,
            failed = report.failed.len(),
            "teardown completed"
        );
        report
    }

    async fn spawn_ego_with_retry(&self, spawn: &SpawnConfig) -> Result<ActorId> {
        let attempts = self.config.ego_spawn_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self
                .client
                .spawn_vehicle(
                    &spawn.ego_blueprint,
                    spawn.ego_transform,
                    Some(&spawn.role_name),
                )
                .await
            {
                Ok(actor_id) => {
                    info!(actor_id, attempt, "ego spawned");
                    return Ok(actor_id);
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "ego spawn failed");
                    metrics::counter!("scenario_spawn_failures_total", "role" => "ego")
                        .increment(1);
                    last_error = e.to_string();
                    if attempt < attempts {
                        self.pause(self.config.spawn_backoff_ms).await;
                    }
                }
            }
        }

        error!(attempts, "giving up on ego spawn");
        Err(ActorFactoryError::EgoSpawnExhausted {
            attempts,
            message: last_error,
        })
    }

    async fn attach_collision_sensor(
        &self,
        ego_id: ActorId,
    ) -> Result<(ActorId, Box<dyn CollisionSensor>)> {
        let sensor_id = self.client.spawn_collision_sensor(ego_id).await?;
        match self.client.collision_sensor(sensor_id) {
            Some(sensor) => Ok((sensor_id, sensor)),
            None => {
                self.destroy_actor_safe(sensor_id, "collision_sensor").await;
                Err(ActorFactoryError::sensor_spawn(
                    "collision",
                    format!("actor_{ego_id}"),
                    "spawned actor is not a collision sensor",
                ))
            }
        }
    }

    /// 逐个 spawn 背景车辆，失败的跳过
    async fn spawn_ambient(&self, ambient: &[(String, Transform)]) -> Vec<AmbientActor> {
        let mut spawned = Vec::with_capacity(ambient.len());
        for (index, (blueprint, transform)) in ambient.iter().enumerate() {
            match self.client.spawn_vehicle(blueprint, *transform, None).await {
                Ok(actor_id) => {
                    if let Err(e) = self.client.set_autopilot(actor_id, true).await {
                        warn!(actor_id, error = %e, "failed to enable ambient autopilot");
                    }
                    debug!(actor_id, index, "ambient vehicle spawned");
                    spawned.push(AmbientActor {
                        actor_id,
                        spawn_transform: *transform,
                        autopilot: true,
                    });
                }
                Err(e) => {
                    warn!(index, blueprint = %blueprint, error = %e, "ambient spawn failed, skipping");
                    metrics::counter!("scenario_spawn_failures_total", "role" => "ambient")
                        .increment(1);
                }
            }
        }
        spawned
    }

    async fn release_autopilot(&self, actor_id: ActorId) {
        if let Err(e) = self.client.set_autopilot(actor_id, false).await {
            debug!(actor_id, error = %e, "autopilot release failed");
        }
    }

    async fn destroy_into(&self, report: &mut TeardownReport, actor_id: ActorId, role: &str) {
        if self.destroy_actor_safe(actor_id, role).await {
            report.destroyed += 1;
        } else {
            report.failed.push(actor_id);
        }
    }

    /// 安全销毁 actor（忽略错误，仅记录日志）
    #[instrument(name = "lifecycle_destroy_actor", skip(self, role), fields(actor_id, role = %role))]
    async fn destroy_actor_safe(&self, actor_id: ActorId, role: &str) -> bool {
        debug!(actor_id, role, "destroying actor");

        match self.client.destroy_actor(actor_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(actor_id, role, error = %e, "failed to destroy actor");
                false
            }
        }
    }

    async fn pause(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

/// 地图名比较：引擎返回完整路径 (Carla/Maps/Town03)，配置可能只写短名
fn map_matches(current: &str, wanted: &str) -> bool {
    let short = |s: &str| s.rsplit('/').next().unwrap_or(s).to_string();
    short(current) == short(wanted)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::mock_client::{MockConfig, MockEvent, MockSimClient};
    use contracts::{SpawnPoint, Vector3};

    fn scenario(npcs: usize) -> ScenarioConfig {
        let mut config = ScenarioConfig::with_ego(
            "Town03",
            SpawnPoint {
                x: 0.0,
                y: 0.0,
                z: 0.5,
                yaw: 0.0,
            },
        );
        config.npc.spawn_points = (0..npcs)
            .map(|i| SpawnPoint {
                x: 15.0 * (i + 1) as f64,
                y: 0.0,
                z: 0.5,
                yaw: 0.0,
            })
            .collect();
        config
    }

    async fn setup(mock: MockConfig) -> (ActorLifecycleManager<MockSimClient>, MockSimClient) {
        let config = scenario(0);
        let client = MockSimClient::with_config(mock);
        let probe = client.clone();
        let mut manager = ActorLifecycleManager::new(client, config.lifecycle.clone());
        manager
            .prepare_world(&config.world, &config.traffic_manager)
            .await
            .unwrap();
        (manager, probe)
    }

    fn noop() -> CollisionCallback {
        Arc::new(|_| {})
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_round_success() {
        let (mut manager, probe) = setup(MockConfig::default()).await;
        let spawn = SpawnConfig::from_scenario(&scenario(2), ControlMode::Learned);

        let actors = manager.spawn_round(&spawn, noop()).await.unwrap();

        assert_eq!(actors.ambient.len(), 2);
        assert_eq!(actors.sensor.parent_id, actors.ego.actor_id);
        assert!(!actors.ego.autopilot);
        assert_eq!(probe.actor_count(), 4);
        assert_eq!(probe.is_autopilot(actors.ego.actor_id), Some(false));
        assert!(actors
            .ambient
            .iter()
            .all(|a| probe.is_autopilot(a.actor_id) == Some(true)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autopilot_mode_hands_ego_to_engine() {
        let (mut manager, probe) = setup(MockConfig::default()).await;
        let spawn = SpawnConfig::from_scenario(&scenario(0), ControlMode::Autopilot);

        let actors = manager.spawn_round(&spawn, noop()).await.unwrap();
        assert!(actors.ego.autopilot);
        assert_eq!(probe.is_autopilot(actors.ego.actor_id), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ego_spawn_retries_then_succeeds() {
        let (mut manager, probe) = setup(MockConfig {
            ego_spawn_failures: 2,
            ..Default::default()
        })
        .await;
        let spawn = SpawnConfig::from_scenario(&scenario(0), ControlMode::Learned);

        assert!(manager.spawn_round(&spawn, noop()).await.is_ok());
        assert_eq!(probe.ego_spawn_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ego_spawn_exhausted() {
        let (mut manager, probe) = setup(MockConfig {
            ego_spawn_failures: 3,
            ..Default::default()
        })
        .await;
        let spawn = SpawnConfig::from_scenario(&scenario(1), ControlMode::Learned);

        let err = manager.spawn_round(&spawn, noop()).await.unwrap_err();
        assert!(matches!(
            err,
            ActorFactoryError::EgoSpawnExhausted { attempts: 3, .. }
        ));
        assert_eq!(probe.actor_count(), 0);
        assert!(!manager.is_round_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_failure_destroys_ego() {
        let (mut manager, probe) = setup(MockConfig {
            fail_sensor: true,
            ..Default::default()
        })
        .await;
        let spawn = SpawnConfig::from_scenario(&scenario(1), ControlMode::Learned);

        let err = manager.spawn_round(&spawn, noop()).await.unwrap_err();
        assert!(matches!(err, ActorFactoryError::SensorSpawnFailed { .. }));
        assert_eq!(probe.actor_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambient_failures_are_skipped() {
        let (mut manager, probe) = setup(MockConfig {
            fail_blueprints: vec!["vehicle.bad".to_string()],
            ..Default::default()
        })
        .await;
        let mut config = scenario(3);
        config.npc.blueprints = vec![
            "vehicle.audi.a2".to_string(),
            "vehicle.bad".to_string(),
            "vehicle.audi.a2".to_string(),
        ];
        let spawn = SpawnConfig::from_scenario(&config, ControlMode::Learned);

        let actors = manager.spawn_round(&spawn, noop()).await.unwrap();
        assert_eq!(actors.ambient.len(), 2);
        assert_eq!(probe.actor_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_spawn_rejected_while_live() {
        let (mut manager, _probe) = setup(MockConfig::default()).await;
        let spawn = SpawnConfig::from_scenario(&scenario(0), ControlMode::Learned);

        manager.spawn_round(&spawn, noop()).await.unwrap();
        let err = manager.spawn_round(&spawn, noop()).await.unwrap_err();
        assert!(matches!(err, ActorFactoryError::RoundActive { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_order_and_no_late_callbacks() {
        let (mut manager, probe) = setup(MockConfig::default()).await;
        let spawn = SpawnConfig::from_scenario(&scenario(2), ControlMode::Learned);

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let actors = manager
            .spawn_round(&spawn, Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .await
            .unwrap();

        assert!(probe.trigger_collision(actors.ego.actor_id, 1, Vector3::new(10.0, 0.0, 0.0)));
        let report = manager.teardown_round().await;

        assert!(report.is_clean());
        assert_eq!(report.destroyed, 4);
        assert_eq!(probe.actor_count(), 0);

        let destroyed: Vec<ActorId> = probe
            .events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Destroyed(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(destroyed, actors.teardown_order());

        assert!(!probe.trigger_collision(actors.ego.actor_id, 1, Vector3::default()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_continues_past_failures() {
        let (mut manager, probe) = setup(MockConfig {
            // 第一个 spawn 的 actor 即主车
            fail_destroy: vec![1000],
            ..Default::default()
        })
        .await;
        let spawn = SpawnConfig::from_scenario(&scenario(1), ControlMode::Learned);
        manager.spawn_round(&spawn, noop()).await.unwrap();

        let report = manager.teardown_round().await;
        assert_eq!(report.failed, vec![1000]);
        assert_eq!(report.destroyed, 2);
        assert_eq!(probe.all_actor_ids(), vec![1000]);
        assert!(!manager.is_round_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_idempotent() {
        let (mut manager, _probe) = setup(MockConfig::default()).await;
        let spawn = SpawnConfig::from_scenario(&scenario(1), ControlMode::Learned);
        manager.spawn_round(&spawn, noop()).await.unwrap();

        assert_eq!(manager.teardown_round().await.destroyed, 3);
        // Second teardown is a no-op
        assert_eq!(manager.teardown_round().await, TeardownReport::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prepare_world_loads_other_map() {
        let (_manager, probe) = setup(MockConfig {
            map_name: "Carla/Maps/Town01".to_string(),
            ..Default::default()
        })
        .await;
        assert!(probe
            .events()
            .contains(&MockEvent::MapLoaded("Town03".to_string())));
        assert!(probe.traffic_manager().is_some());
    }

    #[test]
    fn test_map_matches_short_names() {
        assert!(map_matches("Carla/Maps/Town03", "Town03"));
        assert!(map_matches("Town03", "Town03"));
        assert!(!map_matches("Carla/Maps/Town01", "Town03"));
    }
}
