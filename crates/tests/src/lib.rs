//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约一致性测试
//! - 基于 mock 引擎的 e2e 测试（无需 CARLA）

#[cfg(test)]
mod contract_tests {
    use contracts::{Observation, OBSERVATION_DIM};

    #[test]
    fn test_observation_flattens_to_declared_dim() {
        assert_eq!(Observation::default().to_vec().len(), OBSERVATION_DIM);
    }

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use actor_factory::{MockConfig, MockSimClient};
    use agent::{checkpoint_path, AgentConfig, ReplayAgent, HISTORY_FILE};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ControlMode, LearningAgent, ScenarioConfig, Telemetry, TelemetrySinkConfig,
        TelemetrySinkType, TrainingHistory, Vector3,
    };
    use scenario_runtime::ScenarioController;
    use tokio::sync::mpsc;

    const SCENARIO_TOML: &str = r#"
[world]
map = "Town03"

[ego.spawn_point]
x = 0.0
y = 0.0
z = 0.5
yaw = 0.0

[[npc.spawn_points]]
x = 40.0
y = 0.0
z = 0.5

[[npc.spawn_points]]
x = 80.0
y = 0.0
z = 0.5

[rounds]
round_duration_sec = 1.0
max_rounds = 2
tick_hz = 20.0
"#;

    fn scenario() -> ScenarioConfig {
        ConfigLoader::load_from_str(SCENARIO_TOML, ConfigFormat::Toml).unwrap()
    }

    fn agent_config(dir: &Path) -> AgentConfig {
        AgentConfig {
            seed: Some(11),
            min_replay: 8,
            batch_size: 4,
            epsilon: 0.0,
            epsilon_min: 0.0,
            checkpoint_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn file_sink(name: &str, file: &str) -> TelemetrySinkConfig {
        TelemetrySinkConfig {
            name: name.to_string(),
            sink_type: TelemetrySinkType::File,
            queue_capacity: 4096,
            params: HashMap::from([("file".to_string(), file.to_string())]),
        }
    }

    fn read_jsonl(path: &Path) -> Vec<Telemetry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Config → Controller(ReplayAgent, mock engine) → Dispatcher → JSONL
    #[tokio::test(start_paused = true)]
    async fn test_e2e_learned_rounds_with_replay_agent() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockSimClient::new();

        let (tx, rx) = mpsc::channel(1024);
        let sinks = vec![
            file_sink("jsonl", "telemetry.jsonl"),
            TelemetrySinkConfig {
                name: "log".to_string(),
                sink_type: TelemetrySinkType::Log,
                queue_capacity: 64,
                params: HashMap::new(),
            },
        ];
        let dispatcher = telemetry::create_dispatcher(sinks, dir.path().to_path_buf(), rx)
            .unwrap()
            .spawn();

        let agent = ReplayAgent::new(agent_config(dir.path()));
        let mut controller =
            ScenarioController::new(scenario(), client.clone(), agent).with_telemetry(tx);

        let summary = controller.run().await.unwrap();
        let sink_metrics = dispatcher.await.unwrap();

        // 两轮到时结束，全部 actor 已销毁
        assert_eq!(summary.rounds_completed, 2);
        assert_eq!(summary.observation_misses, 0);
        assert_eq!(client.actor_count(), 0);

        // agent 收到经验并训练，历史与 checkpoint 已落盘
        let agent = controller.agent();
        assert_eq!(agent.replay().len() as u64, summary.experiences);
        assert!(agent.train_steps() > 0);
        assert_eq!(agent.history().rounds(), 2);
        assert!(checkpoint_path(dir.path(), 0).exists());
        assert!(checkpoint_path(dir.path(), 1).exists());

        let history: TrainingHistory =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap())
                .unwrap();
        assert_eq!(history.episode_rewards, summary.round_rewards);

        // 每个 tick 一条遥测，轮次下标始终小于最大轮数
        let telemetry = read_jsonl(&dir.path().join("telemetry.jsonl"));
        assert_eq!(telemetry.len() as u64, summary.ticks);
        assert!(telemetry.iter().all(|t| t.round_index < 2 && t.max_rounds == 2));
        assert!(telemetry.iter().all(|t| t.ambient_count == 2));
        assert!(sink_metrics
            .iter()
            .all(|(_, m)| m.written == summary.ticks && m.failed == 0));
    }

    /// 启发式策略沿 +x 车道前进
    #[tokio::test(start_paused = true)]
    async fn test_e2e_heuristic_policy_drives_forward() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = scenario();
        config.npc.spawn_points.clear();
        config.rounds.max_rounds = 1;
        config.rounds.round_duration_sec = 2.0;

        let (tx, mut rx) = mpsc::channel(1024);
        let mut controller = ScenarioController::new(
            config,
            MockSimClient::new(),
            ReplayAgent::new(agent_config(dir.path())),
        )
        .with_telemetry(tx);
        controller.run().await.unwrap();

        let mut last = None;
        while let Ok(t) = rx.try_recv() {
            last = Some(t);
        }
        let last = last.unwrap();
        assert!(last.throttle > 0.0);
        assert!(last.speed_kmh > 0.0);
        assert!(last.location.x > 0.1);
    }

    /// 碰撞产生一条终止经验，并把本轮奖励拉低
    #[tokio::test(start_paused = true)]
    async fn test_e2e_collision_penalised() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = scenario();
        config.rounds.max_rounds = 1;
        config.rounds.round_duration_sec = 2.0;

        let client = MockSimClient::new();
        let injector = client.clone();
        let mut controller = ScenarioController::new(
            config,
            client,
            ReplayAgent::new(agent_config(dir.path())),
        );

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1200)).await;
            // 第一轮: ego = 1000, 传感器 = 1001, 背景车 = 1002/1003
            injector.trigger_collision(1000, 1002, Vector3::new(0.0, 900.0, 0.0));
            injector.trigger_collision(1000, 1002, Vector3::new(0.0, 400.0, 0.0));
        });

        let summary = controller.run().await.unwrap();

        assert_eq!(summary.collisions, 1);
        assert!(summary.round_rewards[0] < -50.0);
    }

    /// 生成点文件 + autopilot：agent 完全不参与
    #[tokio::test(start_paused = true)]
    async fn test_e2e_spawn_point_file_autopilot() {
        let dir = tempfile::tempdir().unwrap();
        let mut points = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        points
            .write_all(
                br#"{
                    "map_name": "Town05",
                    "ego_point": { "x": 0.0, "y": 0.0, "z": 0.5, "yaw": 0.0 },
                    "npc_points": [ { "x": 30.0, "y": 0.0, "z": 0.5, "yaw": 0.0 } ]
                }"#,
            )
            .unwrap();

        let mut config = ConfigLoader::load_spawn_points(points.path()).unwrap();
        config.rounds.max_rounds = 1;
        config.rounds.round_duration_sec = 1.0;
        config.rounds.tick_hz = 20.0;
        config.rounds.initial_mode = ControlMode::Autopilot;

        let client = MockSimClient::with_config(MockConfig::default());
        let mut controller = ScenarioController::new(
            config,
            client.clone(),
            ReplayAgent::new(agent_config(dir.path())),
        );
        let summary = controller.run().await.unwrap();

        // 地图不一致时先加载配置中的地图
        assert!(client
            .events()
            .contains(&actor_factory::MockEvent::MapLoaded("Town05".to_string())));
        assert_eq!(summary.rounds_completed, 1);
        assert_eq!(summary.experiences, 0);
        assert_eq!(controller.agent().history().rounds(), 0);
        assert!(!checkpoint_path(dir.path(), 0).exists());
    }

    /// 从 checkpoint 恢复后训练历史继续累积
    #[tokio::test(start_paused = true)]
    async fn test_e2e_resume_extends_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = scenario();
        config.rounds.max_rounds = 1;

        let mut first = ScenarioController::new(
            config.clone(),
            MockSimClient::new(),
            ReplayAgent::new(agent_config(dir.path())),
        );
        first.run().await.unwrap();

        let resumed =
            ReplayAgent::resume(agent_config(dir.path()), &checkpoint_path(dir.path(), 0)).unwrap();
        assert_eq!(resumed.history().rounds(), 1);

        let mut second = ScenarioController::new(config, MockSimClient::new(), resumed);
        second.run().await.unwrap();

        assert_eq!(second.agent().history().rounds(), 2);
        let history: TrainingHistory =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(HISTORY_FILE)).unwrap())
                .unwrap();
        assert_eq!(history.rounds(), 2);
    }
}
