//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::ControlMode;
use std::path::PathBuf;

/// CARLA Scenario - episodic driving scenario controller for CARLA simulator
#[derive(Parser, Debug)]
#[command(
    name = "carla-scenario",
    author,
    version,
    about = "Episodic CARLA driving scenario controller",
    long_about = "Runs repeated fixed-length driving rounds against a CARLA server.\n\n\
                  Each round spawns the ego vehicle, its collision sensor and ambient \n\
                  traffic, drives the ego with a learning agent or the autopilot, and \n\
                  tears everything down before the next round."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_SCENARIO_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_SCENARIO_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario rounds
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Where the scenario configuration comes from
#[derive(Parser, Debug, Clone)]
pub struct ConfigSource {
    /// Path to scenario configuration file (TOML or JSON)
    #[arg(short, long, env = "CARLA_SCENARIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Spawn point JSON written by the spawn point selector.
    /// Overrides map and spawn poses of --config, or is used alone with defaults.
    #[arg(long, env = "CARLA_SCENARIO_SPAWN_POINTS")]
    pub spawn_points: Option<PathBuf>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Override CARLA server host from configuration
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port from configuration
    #[arg(long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Override number of rounds
    #[arg(long, env = "CARLA_SCENARIO_MAX_ROUNDS")]
    pub max_rounds: Option<u32>,

    /// Override round duration in seconds
    #[arg(long, env = "CARLA_SCENARIO_ROUND_SECS")]
    pub round_secs: Option<f64>,

    /// Override initial control mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output directory (default: scenario_output_<timestamp>)
    #[arg(short, long, env = "CARLA_SCENARIO_OUTPUT")]
    pub output_dir: Option<PathBuf>,

    /// Resume the agent from a checkpoint file
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Seed for the agent's exploration RNG
    #[arg(long, env = "CARLA_SCENARIO_SEED")]
    pub seed: Option<u64>,

    /// Do not read operator commands from stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_SCENARIO_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List ambient vehicle spawn poses
    #[arg(long)]
    pub npcs: bool,

    /// Show telemetry sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Control mode
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// The learning agent drives
    Learned,
    /// The simulator's autopilot drives
    Autopilot,
}

impl From<ModeArg> for ControlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Learned => ControlMode::Learned,
            ModeArg::Autopilot => ControlMode::Autopilot,
        }
    }
}
