//! `run` command implementation.

use std::path::PathBuf;

use agent::AgentConfig;
use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ControlMode, ScenarioConfig};
use tracing::info;

use super::load_config;
use crate::cli::RunArgs;
use crate::session::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_scenario(args: &RunArgs) -> Result<()> {
    let mut scenario = load_config(&args.source)?;
    apply_overrides(&mut scenario, args);
    ConfigLoader::validate(&scenario).context("Configuration invalid after CLI overrides")?;

    info!(
        map = %scenario.world.map,
        host = %scenario.world.carla_host,
        port = scenario.world.carla_port,
        max_rounds = scenario.rounds.max_rounds,
        round_secs = scenario.rounds.round_duration_sec,
        mode = %scenario.rounds.initial_mode,
        npcs = scenario.npc.spawn_points.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&scenario);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let output_dir = resolve_output_dir(args, &scenario);
    let agent = AgentConfig {
        seed: args.seed,
        checkpoint_dir: output_dir.clone(),
        ..Default::default()
    };

    let session = Session::new(SessionConfig {
        scenario,
        agent,
        resume: args.resume.clone(),
        output_dir,
        read_stdin: !args.no_stdin,
    });

    info!("Starting scenario (commands on stdin: stop | toggle | save)");
    let stats = session.run().await.context("Scenario execution failed")?;

    info!(
        rounds = stats.summary.rounds_completed,
        ticks = stats.summary.ticks,
        duration_secs = stats.duration.as_secs_f64(),
        "Scenario completed"
    );
    stats.print_summary();

    Ok(())
}

fn apply_overrides(scenario: &mut ScenarioConfig, args: &RunArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        scenario.world.carla_host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding CARLA port from CLI");
        scenario.world.carla_port = port;
    }
    if let Some(rounds) = args.max_rounds {
        scenario.rounds.max_rounds = rounds;
    }
    if let Some(secs) = args.round_secs {
        scenario.rounds.round_duration_sec = secs;
    }
    if let Some(mode) = args.mode {
        scenario.rounds.initial_mode = ControlMode::from(mode);
    }
}

/// `--output-dir`, then `output.dir`, then a timestamped directory
fn resolve_output_dir(args: &RunArgs, scenario: &ScenarioConfig) -> PathBuf {
    args.output_dir
        .clone()
        .or_else(|| scenario.output.dir.clone())
        .unwrap_or_else(|| {
            let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(format!("scenario_output_{stamp}"))
        })
}

/// Print configuration summary for dry-run mode
fn print_config_summary(scenario: &ScenarioConfig) {
    let ego = &scenario.ego.spawn_point;
    println!("\n=== Configuration Summary ===\n");
    println!("World:");
    println!("  Map: {}", scenario.world.map);
    println!(
        "  CARLA: {}:{}",
        scenario.world.carla_host, scenario.world.carla_port
    );
    println!("\nEgo:");
    println!(
        "  {} at ({:.1}, {:.1}, {:.1}) yaw {:.1}",
        scenario.ego.blueprint, ego.x, ego.y, ego.z, ego.yaw
    );
    println!("\nAmbient vehicles: {}", scenario.npc.spawn_points.len());

    let rounds = &scenario.rounds;
    println!("\nRounds:");
    println!("  Count: {}", rounds.max_rounds);
    println!("  Duration: {:.1}s", rounds.round_duration_sec);
    println!("  Tick rate: {:.1} Hz", rounds.tick_hz);
    println!("  Initial mode: {}", rounds.initial_mode);

    if !scenario.output.telemetry_sinks.is_empty() {
        println!("\nTelemetry sinks ({}):", scenario.output.telemetry_sinks.len());
        for sink in &scenario.output.telemetry_sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
