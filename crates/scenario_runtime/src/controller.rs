//! 场景控制器
//!
//! 单线程固定频率 tick 循环，驱动轮次状态机、观测编码、奖励协调和遥测刷新。
//!
//! # 取消
//! 操作员命令在每个 tick 之前检查 (`biased` select)，不会打断进行中的 tick。
//! 无论正常结束、操作员停止还是 setup 失败，`run` 返回前都会完成 teardown。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actor_factory::{ActorLifecycleManager, SimClient, SpawnConfig};
use contracts::{
    ActorId, EngineSnapshot, LearningAgent, RoadMap, ScenarioConfig, Telemetry,
};
use encoder::ObservationEncoder;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::collision::{collision_channel, CollisionInbox};
use crate::command::OperatorCommand;
use crate::coordinator::{CollisionOutcome, RewardCoordinator};
use crate::error::{Result, ScenarioError};
use crate::mediator::ControlMediator;
use crate::state::{RoundPhase, RoundState, RoundStateMachine};
use crate::summary::RunSummary;

const COMMAND_QUEUE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundOutcome {
    Expired,
    Stopped,
}

pub struct ScenarioController<C: SimClient, A: LearningAgent> {
    config: ScenarioConfig,
    lifecycle: ActorLifecycleManager<C>,
    encoder: ObservationEncoder,
    agent: A,
    machine: RoundStateMachine,
    coordinator: RewardCoordinator,
    mediator: ControlMediator,
    output_dir: PathBuf,
    telemetry_tx: Option<mpsc::Sender<Telemetry>>,
    commands_tx: mpsc::Sender<OperatorCommand>,
    commands_rx: mpsc::Receiver<OperatorCommand>,
    inbox: Option<CollisionInbox>,
    latest_telemetry: Option<Telemetry>,
    summary: RunSummary,
}

impl<C: SimClient, A: LearningAgent> ScenarioController<C, A> {
    pub fn new(config: ScenarioConfig, client: C, agent: A) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);
        let rounds = &config.rounds;
        Self {
            lifecycle: ActorLifecycleManager::new(client, config.lifecycle.clone()),
            encoder: ObservationEncoder::new(config.encoder.clone()),
            agent,
            machine: RoundStateMachine::new(
                rounds.max_rounds,
                Duration::from_secs_f64(rounds.round_duration_sec),
            ),
            coordinator: RewardCoordinator::new(rounds.collision_cooldown_sec),
            mediator: ControlMediator::new(rounds.initial_mode),
            output_dir: config
                .output
                .dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            telemetry_tx: None,
            commands_tx,
            commands_rx,
            inbox: None,
            latest_telemetry: None,
            summary: RunSummary::default(),
            config,
        }
    }

    /// 遥测导出目录
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// 每个 tick 的遥测发往该通道 (满时丢弃)
    pub fn with_telemetry(mut self, tx: mpsc::Sender<Telemetry>) -> Self {
        self.telemetry_tx = Some(tx);
        self
    }

    /// 操作员命令发送端
    pub fn operator(&self) -> mpsc::Sender<OperatorCommand> {
        self.commands_tx.clone()
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn lifecycle(&self) -> &ActorLifecycleManager<C> {
        &self.lifecycle
    }

    pub fn phase(&self) -> RoundPhase {
        self.machine.phase()
    }

    /// 进入 Setup 的次数
    pub fn setups(&self) -> u32 {
        self.machine.setups()
    }

    /// 运行全部轮次
    ///
    /// 返回后所有 actor 已销毁，遥测通道已关闭。
    #[instrument(
        name = "scenario_run",
        skip(self),
        fields(
            map = %self.config.world.map,
            max_rounds = self.config.rounds.max_rounds,
            mode = %self.mediator.mode()
        )
    )]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let result = self.run_rounds().await;

        let report = self.lifecycle.teardown_round().await;
        self.summary.teardown_failures += report.failed.len();
        self.machine.finish();
        self.inbox = None;
        self.telemetry_tx = None;

        self.summary.experiences = self.coordinator.experiences();
        self.summary.final_mode = self.mediator.mode();
        match &result {
            Ok(()) => info!(
                rounds = self.summary.rounds_completed,
                ticks = self.summary.ticks,
                stopped = self.summary.stopped_by_operator,
                "scenario finished"
            ),
            Err(e) => error!(error = %e, "scenario aborted"),
        }
        result.map(|()| self.summary.clone())
    }

    async fn run_rounds(&mut self) -> Result<()> {
        self.lifecycle
            .prepare_world(&self.config.world, &self.config.traffic_manager)
            .await
            .map_err(ScenarioError::WorldSetup)?;
        let road = self.lifecycle.client().road_map().ok_or_else(|| {
            ScenarioError::RoadMapUnavailable {
                map: self.config.world.map.clone(),
            }
        })?;

        self.machine.begin()?;

        let period = Duration::from_secs_f64(1.0 / self.config.rounds.tick_hz);
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.machine.phase() == RoundPhase::Setup {
            if self.stop_requested().await {
                return Ok(());
            }
            self.setup_round().await?;
            interval.reset();

            let outcome = self.run_round(&mut interval, &road).await?;
            let closed = self.machine.begin_reset()?;
            self.close_round(&closed, outcome);

            self.inbox = None;
            let report = self.lifecycle.teardown_round().await;
            if !report.is_clean() {
                warn!(round = closed.index, failed = ?report.failed, "teardown left actors behind");
            }
            self.summary.teardown_failures += report.failed.len();

            match outcome {
                RoundOutcome::Stopped => {
                    self.machine.finish();
                    return Ok(());
                }
                RoundOutcome::Expired => {
                    self.machine.finish_reset()?;
                }
            }
        }
        Ok(())
    }

    /// Setup 期间排队的命令；Stop 优先
    async fn stop_requested(&mut self) -> bool {
        while let Ok(command) = self.commands_rx.try_recv() {
            if self.handle_command(command).await {
                self.machine.finish();
                return true;
            }
        }
        false
    }

    #[instrument(name = "scenario_setup_round", skip(self), fields(round = self.machine.round_index()))]
    async fn setup_round(&mut self) -> Result<()> {
        let round = self.machine.round_index();
        let spawn = SpawnConfig::from_scenario(&self.config, self.mediator.mode());
        let (callback, inbox) = collision_channel();

        if let Err(source) = self.lifecycle.spawn_round(&spawn, callback).await {
            error!(round, error = %source, "round setup failed, aborting");
            self.machine.finish();
            return Err(ScenarioError::RoundSetup { round, source });
        }

        self.inbox = Some(inbox);
        self.coordinator.reset_round();
        self.machine.start_running(Instant::now())?;
        Ok(())
    }

    async fn run_round(
        &mut self,
        interval: &mut Interval,
        road: &Arc<dyn RoadMap>,
    ) -> Result<RoundOutcome> {
        loop {
            tokio::select! {
                biased;

                Some(command) = self.commands_rx.recv() => {
                    if self.handle_command(command).await {
                        return Ok(RoundOutcome::Stopped);
                    }
                }
                _ = interval.tick() => {
                    self.tick(road.as_ref()).await;
                    let expired = self
                        .machine
                        .current()
                        .is_some_and(|round| round.is_expired(Instant::now()));
                    if expired {
                        return Ok(RoundOutcome::Expired);
                    }
                }
            }
        }
    }

    fn ego_id(&self) -> Option<ActorId> {
        self.lifecycle.actors().map(|actors| actors.ego.actor_id)
    }

    async fn tick(&mut self, road: &dyn RoadMap) {
        let started = Instant::now();
        self.summary.ticks += 1;
        metrics::counter!("scenario_ticks_total").increment(1);

        let Some(ego_id) = self.ego_id() else {
            return;
        };

        let collisions = self
            .inbox
            .as_ref()
            .map(CollisionInbox::drain)
            .unwrap_or_default();

        let snapshot = self.query_snapshot(ego_id).await;
        let learned = self.mediator.mode().is_learned();
        let observation = match (&snapshot, learned) {
            (Some(snapshot), true) => Some(self.encoder.encode(snapshot, road)),
            _ => None,
        };

        for event in &collisions {
            let Some(round) = self.machine.current_mut() else {
                break;
            };
            let outcome = self.coordinator.on_collision(
                &mut self.agent,
                round,
                event,
                learned,
                observation.as_ref(),
            );
            if outcome != CollisionOutcome::Debounced {
                self.summary.collisions += 1;
                metrics::counter!("scenario_collisions_total").increment(1);
            }
        }

        if let (Some(observation), Some(snapshot)) = (observation, &snapshot) {
            let off_road =
                snapshot.ego.transform.location.z <= self.config.rounds.off_road_altitude;
            if let Some(round) = self.machine.current_mut() {
                let action =
                    self.coordinator
                        .on_tick(&mut self.agent, round, observation, off_road);
                self.mediator
                    .apply(self.lifecycle.client(), ego_id, &action)
                    .await;
            }
        }

        if let Some(snapshot) = &snapshot {
            self.publish_telemetry(snapshot);
        }

        metrics::histogram!("scenario_tick_latency_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);
    }

    /// 有界快照查询；超时或失败视为本 tick 无更新
    async fn query_snapshot(&mut self, ego_id: ActorId) -> Option<EngineSnapshot> {
        let budget = Duration::from_millis(self.config.lifecycle.query_timeout_ms);
        let result = time::timeout(budget, self.lifecycle.client().snapshot(ego_id)).await;
        match result {
            Ok(Ok(snapshot)) => return Some(snapshot),
            Ok(Err(e)) => debug!(ego_id, error = %e, "snapshot failed, skipping tick"),
            Err(_) => debug!(
                ego_id,
                budget_ms = budget.as_millis() as u64,
                "snapshot timed out, skipping tick"
            ),
        }
        self.summary.observation_misses += 1;
        metrics::counter!("scenario_observation_misses_total").increment(1);
        None
    }

    fn publish_telemetry(&mut self, snapshot: &EngineSnapshot) {
        let Some(round) = self.machine.current() else {
            return;
        };
        let ego = &snapshot.ego;
        let telemetry = Telemetry {
            round_index: round.index,
            max_rounds: self.machine.max_rounds(),
            time_remaining: round.remaining(Instant::now()).as_secs_f64(),
            mode: self.mediator.mode(),
            speed_kmh: ego.speed() * 3.6,
            heading: ego.transform.rotation.yaw,
            steer: ego.control.steer,
            throttle: ego.control.throttle,
            brake: ego.control.brake,
            gear: ego.control.gear,
            location: ego.transform.location,
            ambient_count: self
                .lifecycle
                .actors()
                .map_or(0, |actors| actors.ambient.len()),
            cumulative_reward: round.cumulative_reward,
        };

        if let Some(tx) = &self.telemetry_tx {
            if tx.try_send(telemetry.clone()).is_err() {
                trace!("telemetry feed full or closed");
            }
        }
        self.latest_telemetry = Some(telemetry);
    }

    /// 返回 true 表示需要停止
    async fn handle_command(&mut self, command: OperatorCommand) -> bool {
        info!(%command, "operator command");
        match command {
            OperatorCommand::Stop => {
                self.summary.stopped_by_operator = true;
                true
            }
            OperatorCommand::ToggleMode => {
                let ego_id = self.ego_id();
                self.mediator.toggle(self.lifecycle.client(), ego_id).await;
                false
            }
            OperatorCommand::SaveTelemetry => {
                match &self.latest_telemetry {
                    Some(t) => match telemetry::export_snapshot(&self.output_dir, t) {
                        Ok(path) => self.summary.telemetry_exports.push(path),
                        Err(e) => warn!(error = %e, "telemetry export failed"),
                    },
                    None => info!("no telemetry to export yet"),
                }
                false
            }
        }
    }

    /// 到时结束的轮次：记录统计；learned 模式下写入训练历史并保存 checkpoint
    fn close_round(&mut self, closed: &RoundState, outcome: RoundOutcome) {
        if outcome != RoundOutcome::Expired {
            info!(round = closed.index, "round interrupted");
            return;
        }
        let length = closed.elapsed(Instant::now()).as_secs_f64();
        let reward = closed.cumulative_reward;

        self.summary.rounds_completed += 1;
        self.summary.round_rewards.push(reward);
        self.summary.round_lengths_sec.push(length);
        metrics::gauge!("scenario_round_reward").set(reward);

        if self.mediator.mode().is_learned() {
            self.agent.record_round(reward, length);
            if let Err(e) = self.agent.save_model(closed.index) {
                warn!(round = closed.index, error = %e, "checkpoint save failed");
            }
        }
        info!(round = closed.index, reward, length_sec = length, "round completed");
    }
}
