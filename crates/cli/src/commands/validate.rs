//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::ScenarioConfig;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    map: String,
    npc_count: usize,
    max_rounds: u32,
    round_duration_sec: f64,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn describe_source(args: &ValidateArgs) -> String {
    [&args.source.config, &args.source.spawn_points]
        .into_iter()
        .flatten()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" + ")
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let source = describe_source(args);
    info!(source = %source, "Validating configuration");

    match load_config(&args.source) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                source,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    map: config.world.map.clone(),
                    npc_count: config.npc.spawn_points.len(),
                    max_rounds: config.rounds.max_rounds,
                    round_duration_sec: config.rounds.round_duration_sec,
                    sink_count: config.output.telemetry_sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ScenarioConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.npc.spawn_points.is_empty() {
        warnings.push("No ambient vehicles configured - rounds will run with the ego alone".to_string());
    }

    if config.output.telemetry_sinks.is_empty() {
        warnings.push("No telemetry sinks configured - per-tick telemetry is only kept for manual export".to_string());
    }

    let rounds = &config.rounds;
    if rounds.collision_cooldown_sec >= rounds.round_duration_sec {
        warnings.push(format!(
            "collision cooldown ({:.1}s) is not shorter than a round ({:.1}s) - at most one collision per round is rewarded",
            rounds.collision_cooldown_sec, rounds.round_duration_sec
        ));
    }

    let period_ms = 1000.0 / rounds.tick_hz;
    if (config.lifecycle.query_timeout_ms as f64) > period_ms {
        warnings.push(format!(
            "engine query timeout ({} ms) exceeds the tick period ({:.1} ms) - slow queries will stretch ticks",
            config.lifecycle.query_timeout_ms, period_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Map: {}", summary.map);
            println!("  Ambient vehicles: {}", summary.npc_count);
            println!(
                "  Rounds: {} x {:.1}s",
                summary.max_rounds, summary.round_duration_sec
            );
            println!("  Telemetry sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
