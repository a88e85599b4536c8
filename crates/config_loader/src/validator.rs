//! 配置校验模块
//!
//! 校验规则：
//! - 浮点字段有限 (range 规则对 NaN 不生效)
//! - 字段范围 (validator derive)
//! - 地图名非空
//! - NPC 生成点互不重合，且不与主车重合
//! - sink 名称非空且唯一

use std::collections::HashSet;

use contracts::{ContractError, ScenarioConfig, SpawnPoint};
use validator::Validate;

/// 两个生成点之间的最小平面距离 (米)
const MIN_SPAWN_SEPARATION: f64 = 0.1;

/// 校验 ScenarioConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &ScenarioConfig) -> Result<(), ContractError> {
    validate_timing(config)?;
    validate_ranges(config)?;
    validate_map(config)?;
    validate_spawn_points(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// 字段范围校验
fn validate_ranges(config: &ScenarioConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// 时长、频率与距离必须是有限值
///
/// NaN 会通过所有 `range` 比较，随后在 `Duration::from_secs_f64` 处 panic。
fn validate_timing(config: &ScenarioConfig) -> Result<(), ContractError> {
    let encoder = &config.encoder;
    let tm = &config.traffic_manager;
    let fields = [
        ("world.client_timeout_sec", config.world.client_timeout_sec),
        ("rounds.round_duration_sec", config.rounds.round_duration_sec),
        ("rounds.tick_hz", config.rounds.tick_hz),
        ("rounds.collision_cooldown_sec", config.rounds.collision_cooldown_sec),
        ("rounds.off_road_altitude", config.rounds.off_road_altitude),
        ("encoder.radar_radius", encoder.radar_radius),
        ("encoder.traffic_light_radius", encoder.traffic_light_radius),
        ("encoder.lookahead_step", encoder.lookahead_step),
        ("encoder.curvature_probe", encoder.curvature_probe),
        ("encoder.ttc_sentinel", encoder.ttc_sentinel),
        ("encoder.light_distance_sentinel", encoder.light_distance_sentinel),
        (
            "traffic_manager.distance_to_leading_vehicle",
            tm.distance_to_leading_vehicle,
        ),
        ("traffic_manager.global_speed_difference", tm.global_speed_difference),
    ];

    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((field, value)) => Err(ContractError::config_validation(
            *field,
            format!("must be a finite number, got {value}"),
        )),
        None => Ok(()),
    }
}

fn validate_map(config: &ScenarioConfig) -> Result<(), ContractError> {
    if config.world.map.trim().is_empty() {
        return Err(ContractError::config_validation(
            "world.map",
            "map name cannot be empty",
        ));
    }
    Ok(())
}

fn overlaps(a: &SpawnPoint, b: &SpawnPoint) -> bool {
    (a.x - b.x).abs() < MIN_SPAWN_SEPARATION && (a.y - b.y).abs() < MIN_SPAWN_SEPARATION
}

/// 校验生成点互不重合
fn validate_spawn_points(config: &ScenarioConfig) -> Result<(), ContractError> {
    let ego = &config.ego.spawn_point;
    let npcs = &config.npc.spawn_points;

    for (idx, point) in npcs.iter().enumerate() {
        if overlaps(point, ego) {
            return Err(ContractError::config_validation(
                format!("npc.spawn_points[{idx}]"),
                "npc spawn point overlaps ego spawn point",
            ));
        }
        if let Some(dup) = npcs[..idx].iter().position(|other| overlaps(point, other)) {
            return Err(ContractError::config_validation(
                format!("npc.spawn_points[{idx}]"),
                format!("duplicate npc spawn point (same as index {dup})"),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(config: &ScenarioConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.output.telemetry_sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("output.telemetry_sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("output.telemetry_sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("output.telemetry_sinks[{}].queue_capacity", idx),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{TelemetrySinkConfig, TelemetrySinkType};
    use std::collections::HashMap;

    fn point(x: f64, y: f64) -> SpawnPoint {
        SpawnPoint {
            x,
            y,
            z: 0.5,
            yaw: 0.0,
        }
    }

    fn valid_config() -> ScenarioConfig {
        let mut config = ScenarioConfig::with_ego("Town03", point(0.0, 0.0));
        config.npc.spawn_points = vec![point(10.0, 0.0), point(20.0, 3.5)];
        config
    }

    fn sink(name: &str) -> TelemetrySinkConfig {
        TelemetrySinkConfig {
            name: name.into(),
            sink_type: TelemetrySinkType::Log,
            queue_capacity: 16,
            params: HashMap::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_map() {
        let mut config = valid_config();
        config.world.map = "   ".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("world.map"));
    }

    #[test]
    fn test_npc_overlapping_ego() {
        let mut config = valid_config();
        config.npc.spawn_points.push(point(0.05, 0.0));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("overlaps ego"));
    }

    #[test]
    fn test_duplicate_npc_points() {
        let mut config = valid_config();
        config.npc.spawn_points.push(point(10.0, 0.0));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate npc spawn point"));
    }

    #[test]
    fn test_out_of_range_tick_rate() {
        let mut config = valid_config();
        config.rounds.tick_hz = 0.0;
        assert!(matches!(
            validate(&config),
            Err(ContractError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_nan_round_duration_rejected() {
        let mut config = valid_config();
        config.rounds.round_duration_sec = f64::NAN;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("rounds.round_duration_sec"));
    }

    #[test]
    fn test_non_finite_timing_rejected() {
        let mut config = valid_config();
        config.rounds.tick_hz = f64::INFINITY;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.world.client_timeout_sec = f64::NAN;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("world.client_timeout_sec"));

        let mut config = valid_config();
        config.encoder.radar_radius = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_sink_names() {
        let mut config = valid_config();
        config.output.telemetry_sinks = vec![sink("log"), sink("log")];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate sink name"));
    }
}
