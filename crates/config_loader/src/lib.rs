//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON scenario configuration files
//! - Merge spawn point files written by the spawn point selector
//! - Validate configuration legality
//! - Generate `ScenarioConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("scenario.toml")).unwrap();
//! println!("Map: {}", config.world.map);
//! ```

mod parser;
mod spawn_points;
mod validator;

pub use contracts::ScenarioConfig;
pub use parser::ConfigFormat;
pub use spawn_points::SpawnPointFile;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ScenarioConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScenarioConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Load a spawn point file and build a validated configuration with defaults
    pub fn load_spawn_points(path: &Path) -> Result<ScenarioConfig, ContractError> {
        let content = Self::read_file(path)?;
        let config = SpawnPointFile::parse(&content)?.into_config()?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Replace map and spawn poses of `config` with those of a spawn point file
    pub fn merge_spawn_points(
        config: &mut ScenarioConfig,
        path: &Path,
    ) -> Result<(), ContractError> {
        let content = Self::read_file(path)?;
        SpawnPointFile::parse(&content)?.apply_to(config)?;
        validator::validate(config)
    }

    /// Re-run validation (after CLI overrides, for example)
    pub fn validate(config: &ScenarioConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize ScenarioConfig to TOML string
    pub fn to_toml(config: &ScenarioConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ScenarioConfig to JSON string
    pub fn to_json(config: &ScenarioConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScenarioConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[world]
map = "Town03"

[ego.spawn_point]
x = 0.0
y = 0.0
z = 0.5
yaw = 0.0

[[npc.spawn_points]]
x = 15.0
y = 0.0
z = 0.5

[rounds]
round_duration_sec = 20.0
max_rounds = 5

[[output.telemetry_sinks]]
name = "log"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.world.map, "Town03");
        assert_eq!(config.rounds.max_rounds, 5);
        assert_eq!(config.output.telemetry_sinks.len(), 1);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.world.map, config2.world.map);
        assert_eq!(config.npc.spawn_points, config2.npc.spawn_points);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.rounds.round_duration_sec, config2.rounds.round_duration_sec);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = MINIMAL_TOML.replace("max_rounds = 5", "max_rounds = 0");
        let result = ConfigLoader::load_from_str(&content, ConfigFormat::Toml);
        assert!(matches!(
            result,
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_nan_duration_rejected() {
        let content = MINIMAL_TOML.replace("round_duration_sec = 20.0", "round_duration_sec = nan");
        let err = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { ref field, .. }
            if field == "rounds.round_duration_sec"));
    }

    #[test]
    fn test_merge_spawn_points_file() {
        let mut config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"map_name": "Town05", "ego_point": {{"x": 5.0, "y": 5.0, "z": 0.3, "yaw": 45.0}}, "npc_points": []}}"#
        )
        .unwrap();

        ConfigLoader::merge_spawn_points(&mut config, file.path()).unwrap();
        assert_eq!(config.world.map, "Town05");
        assert_eq!(config.ego.spawn_point.yaw, 45.0);
        assert!(config.npc.spawn_points.is_empty());
        assert_eq!(config.rounds.max_rounds, 5);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::load_from_path(Path::new("scenario.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
