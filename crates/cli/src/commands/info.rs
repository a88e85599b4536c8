//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ScenarioConfig, SpawnPoint};
use serde::Serialize;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    world: WorldInfo,
    ego: EgoInfo,
    npc_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    npcs: Vec<NpcInfo>,
    rounds: RoundInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct WorldInfo {
    map: String,
    carla_host: String,
    carla_port: u16,
}

#[derive(Serialize)]
struct EgoInfo {
    blueprint: String,
    role_name: String,
    spawn_point: SpawnPoint,
}

#[derive(Serialize)]
struct NpcInfo {
    blueprint: String,
    spawn_point: SpawnPoint,
}

#[derive(Serialize)]
struct RoundInfo {
    max_rounds: u32,
    round_duration_sec: f64,
    tick_hz: f64,
    collision_cooldown_sec: f64,
    initial_mode: String,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = load_config(&args.source)?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &ScenarioConfig, args: &InfoArgs) -> ConfigInfo {
    let npcs = if args.npcs {
        config
            .npc
            .spawn_points
            .iter()
            .enumerate()
            .map(|(i, point)| NpcInfo {
                blueprint: config.npc.blueprint_for(i).to_string(),
                spawn_point: *point,
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        config
            .output
            .telemetry_sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    let rounds = &config.rounds;
    ConfigInfo {
        version: format!("{:?}", config.version),
        world: WorldInfo {
            map: config.world.map.clone(),
            carla_host: config.world.carla_host.clone(),
            carla_port: config.world.carla_port,
        },
        ego: EgoInfo {
            blueprint: config.ego.blueprint.clone(),
            role_name: config.ego.role_name.clone(),
            spawn_point: config.ego.spawn_point,
        },
        npc_count: config.npc.spawn_points.len(),
        npcs,
        rounds: RoundInfo {
            max_rounds: rounds.max_rounds,
            round_duration_sec: rounds.round_duration_sec,
            tick_hz: rounds.tick_hz,
            collision_cooldown_sec: rounds.collision_cooldown_sec,
            initial_mode: rounds.initial_mode.to_string(),
        },
        sinks,
    }
}

fn format_point(p: &SpawnPoint) -> String {
    format!("({:.1}, {:.1}, {:.1}) yaw {:.1}", p.x, p.y, p.z, p.yaw)
}

fn print_config_info(config: &ScenarioConfig, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              CARLA Scenario Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 World");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Map: {}", config.world.map);
    println!(
        "   └─ CARLA Server: {}:{}",
        config.world.carla_host, config.world.carla_port
    );

    println!("\n🚗 Ego");
    println!("   ├─ Blueprint: {}", config.ego.blueprint);
    println!("   ├─ Role: {}", config.ego.role_name);
    println!("   └─ Spawn: {}", format_point(&config.ego.spawn_point));

    let npcs = &config.npc.spawn_points;
    println!("\n🚙 Ambient Vehicles ({})", npcs.len());
    if args.npcs {
        for (i, point) in npcs.iter().enumerate() {
            let prefix = if i == npcs.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} at {}",
                prefix,
                config.npc.blueprint_for(i),
                format_point(point)
            );
        }
    }

    let rounds = &config.rounds;
    println!("\n⚙️  Rounds");
    println!("   ├─ Count: {}", rounds.max_rounds);
    println!("   ├─ Duration: {:.1}s", rounds.round_duration_sec);
    println!("   ├─ Tick rate: {:.1} Hz", rounds.tick_hz);
    println!("   ├─ Collision cooldown: {:.2}s", rounds.collision_cooldown_sec);
    println!("   └─ Initial mode: {}", rounds.initial_mode);

    let sinks = &config.output.telemetry_sinks;
    if args.sinks && !sinks.is_empty() {
        println!("\n📤 Telemetry Sinks ({})", sinks.len());
        for (i, sink) in sinks.iter().enumerate() {
            let prefix = if i == sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}
