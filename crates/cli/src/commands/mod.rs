//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_scenario;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::ScenarioConfig;
use tracing::info;

use crate::cli::ConfigSource;
use crate::error::{CliError, Result};

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CliError::config_not_found(path.display().to_string()))
    }
}

/// Load the scenario configuration from `--config` and/or `--spawn-points`
///
/// A spawn point file alone yields a default configuration; combined with a
/// configuration file it replaces map and spawn poses.
pub(crate) fn load_config(source: &ConfigSource) -> Result<ScenarioConfig> {
    match (&source.config, &source.spawn_points) {
        (None, None) => Err(CliError::NoConfigSource),
        (Some(config), spawn_points) => {
            ensure_exists(config)?;
            info!(config = %config.display(), "Loading configuration");
            let mut scenario = ConfigLoader::load_from_path(config)?;
            if let Some(points) = spawn_points {
                ensure_exists(points)?;
                info!(spawn_points = %points.display(), "Merging spawn points");
                ConfigLoader::merge_spawn_points(&mut scenario, points)?;
            }
            Ok(scenario)
        }
        (None, Some(points)) => {
            ensure_exists(points)?;
            info!(spawn_points = %points.display(), "Loading spawn points with default settings");
            Ok(ConfigLoader::load_spawn_points(points)?)
        }
    }
}
