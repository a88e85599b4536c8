//! Session orchestrator - wires engine client, agent, controller and telemetry.
//!
//! Runs against a real CARLA server when built with the `real-carla` feature
//! and against the offline mock engine otherwise.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use actor_factory::SimClient;
use agent::{AgentConfig, ReplayAgent};
use anyhow::{Context, Result};
use contracts::{ScenarioConfig, Telemetry};
use scenario_runtime::{OperatorCommand, ScenarioController};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::SessionStats;

/// Per-tick telemetry queue between controller and dispatcher
const TELEMETRY_QUEUE: usize = 1024;

/// Time allowed for telemetry sinks to flush after the last round
const SINK_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scenario: ScenarioConfig,
    pub agent: AgentConfig,
    /// Checkpoint to resume the agent from
    pub resume: Option<PathBuf>,
    /// Receives checkpoints, telemetry exports and the run summary
    pub output_dir: PathBuf,
    /// Read operator commands from stdin
    pub read_stdin: bool,
}

/// One scenario run
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run all rounds to completion (or operator stop)
    pub async fn run(self) -> Result<SessionStats> {
        #[cfg(feature = "real-carla")]
        return self.run_real().await;

        #[cfg(not(feature = "real-carla"))]
        return self.run_mock().await;
    }

    #[cfg(feature = "real-carla")]
    async fn run_real(self) -> Result<SessionStats> {
        info!("Running against CARLA server");
        self.run_with(actor_factory::RealSimClient::new()).await
    }

    #[cfg(not(feature = "real-carla"))]
    async fn run_mock(self) -> Result<SessionStats> {
        info!("Running in MOCK mode (no CARLA server required)");
        self.run_with(actor_factory::MockSimClient::new()).await
    }

    /// Run against any engine client
    pub async fn run_with<C: SimClient>(self, client: C) -> Result<SessionStats> {
        let started = Instant::now();
        let SessionConfig {
            scenario,
            agent,
            resume,
            output_dir,
            read_stdin,
        } = self.config;

        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory {}", output_dir.display())
        })?;
        info!(output_dir = %output_dir.display(), "Output directory ready");

        let agent = match resume {
            Some(path) => {
                info!(checkpoint = %path.display(), "Resuming agent");
                ReplayAgent::resume(agent, &path)
                    .with_context(|| format!("Failed to resume from {}", path.display()))?
            }
            None => ReplayAgent::new(agent),
        };

        // Telemetry fan-out
        let (telemetry_tx, telemetry_rx) = mpsc::channel::<Telemetry>(TELEMETRY_QUEUE);
        if scenario.output.telemetry_sinks.is_empty() {
            debug!("No telemetry sinks configured - telemetry will only feed manual exports");
        }
        let dispatcher = telemetry::create_dispatcher(
            scenario.output.telemetry_sinks.clone(),
            output_dir.clone(),
            telemetry_rx,
        )
        .context("Failed to create telemetry dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let mut controller = ScenarioController::new(scenario, client, agent)
            .with_output_dir(&output_dir)
            .with_telemetry(telemetry_tx);

        // Operator inputs
        let operator = controller.operator();
        if read_stdin {
            spawn_stdin_reader(operator.clone());
        }
        let signals = tokio::spawn(forward_shutdown_signal(operator));

        let result = controller.run().await;
        signals.abort();

        // The controller closed the telemetry channel; wait for sinks to flush
        let sinks = match tokio::time::timeout(SINK_FLUSH_TIMEOUT, dispatcher_handle).await {
            Ok(Ok(sinks)) => sinks,
            Ok(Err(e)) => {
                warn!(error = %e, "Telemetry dispatcher task failed");
                Vec::new()
            }
            Err(_) => {
                warn!("Telemetry sinks did not flush in time");
                Vec::new()
            }
        };

        let summary = result?;

        let summary_path = output_dir.join(RUN_SUMMARY_FILE);
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        std::fs::write(&summary_path, json)
            .with_context(|| format!("Failed to write {}", summary_path.display()))?;

        let stats = SessionStats {
            summary,
            sinks,
            duration: started.elapsed(),
            output_dir,
        };
        stats.record_metrics();
        Ok(stats)
    }
}

/// Forward stdin lines as operator commands
///
/// Uses a plain thread with blocking reads so a pending read never holds up
/// runtime shutdown.
fn spawn_stdin_reader(tx: mpsc::Sender<OperatorCommand>) {
    let spawned = std::thread::Builder::new()
        .name("operator-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<OperatorCommand>() {
                    Ok(command) => {
                        if tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring operator input"),
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin reader, operator commands disabled");
    }
}

/// Ctrl+C / SIGTERM become a `Stop` command so teardown still runs
async fn forward_shutdown_signal(tx: mpsc::Sender<OperatorCommand>) {
    shutdown_signal().await;
    warn!("Received shutdown signal, stopping scenario...");
    let _ = tx.send(OperatorCommand::Stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::MockSimClient;
    use contracts::{ControlMode, SpawnPoint, TelemetrySinkConfig, TelemetrySinkType};
    use std::collections::HashMap;

    fn session(dir: &std::path::Path, rounds: u32) -> Session {
        let mut scenario = ScenarioConfig::with_ego(
            "Town03",
            SpawnPoint {
                x: 0.0,
                y: 0.0,
                z: 0.5,
                yaw: 0.0,
            },
        );
        scenario.rounds.max_rounds = rounds;
        scenario.rounds.round_duration_sec = 1.0;
        scenario.rounds.tick_hz = 20.0;
        scenario.output.telemetry_sinks = vec![TelemetrySinkConfig {
            name: "jsonl".to_string(),
            sink_type: TelemetrySinkType::File,
            queue_capacity: 4096,
            params: HashMap::from([("file".to_string(), "telemetry.jsonl".to_string())]),
        }];

        Session::new(SessionConfig {
            scenario,
            agent: AgentConfig {
                seed: Some(3),
                checkpoint_dir: dir.to_path_buf(),
                ..Default::default()
            },
            resume: None,
            output_dir: dir.to_path_buf(),
            read_stdin: false,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let stats = session(dir.path(), 2)
            .run_with(MockSimClient::new())
            .await
            .unwrap();

        assert_eq!(stats.summary.rounds_completed, 2);
        assert_eq!(stats.summary.final_mode, ControlMode::Learned);
        assert!(dir.path().join(RUN_SUMMARY_FILE).exists());
        assert!(dir.path().join("checkpoint_round_000.json").exists());
        assert!(dir.path().join("checkpoint_round_001.json").exists());
        assert!(dir.path().join(agent::HISTORY_FILE).exists());

        let telemetry = std::fs::read_to_string(dir.path().join("telemetry.jsonl")).unwrap();
        assert_eq!(telemetry.lines().count() as u64, stats.summary.ticks);
        assert_eq!(stats.sinks.len(), 1);
        assert_eq!(stats.sinks[0].1.written, stats.summary.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path(), 1);
        session.config.resume = Some(dir.path().join("missing.json"));

        let result = session.run_with(MockSimClient::new()).await;
        assert!(result.is_err());
    }
}
