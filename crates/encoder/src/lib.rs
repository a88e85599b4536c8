//! # Encoder
//!
//! Observation Encoder: turns one engine snapshot into a fixed-shape
//! [`Observation`].
//!
//! Every sub-encoding is a pure reducer over a bounded candidate list and
//! writes a fixed-size array, so the output shape never depends on how many
//! vehicles, lights or waypoints the scene contains. Missing data is
//! zero-filled (or set to its sentinel), never omitted.

pub mod danger;
pub mod environment;
pub mod kinematics;
pub mod lane;
pub mod radar;

use contracts::{EncoderConfig, EngineSnapshot, Observation, RoadMap};
use tracing::trace;

pub use radar::{sector_for_bearing, RadarReturn};

/// Observation encoder
///
/// Holds only tuning constants; `encode` has no hidden state.
#[derive(Debug, Clone, Default)]
pub struct ObservationEncoder {
    config: EncoderConfig,
}

impl ObservationEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// 编码一帧观测
    ///
    /// 路点前视与危险指标依赖只读路网 `map`。
    pub fn encode(&self, snapshot: &EngineSnapshot, map: &dyn RoadMap) -> Observation {
        let ego = &snapshot.ego;
        let transform = &ego.transform;
        let current = map.nearest_waypoint(&transform.location);
        if current.is_none() {
            trace!(actor_id = ego.actor_id, "ego not on the road graph");
        }

        Observation {
            timestamp: snapshot.timestamp,
            velocity: kinematics::vec3(&ego.velocity),
            acceleration: kinematics::vec3(&ego.acceleration),
            angular_velocity: kinematics::vec3(&ego.angular_velocity),
            location: [
                transform.location.x as f32,
                transform.location.y as f32,
                transform.location.z as f32,
            ],
            rotation: [
                transform.rotation.pitch as f32,
                transform.rotation.yaw as f32,
                transform.rotation.roll as f32,
            ],
            control_state: kinematics::control_state(ego),
            wheel_positions: kinematics::wheel_positions(ego),
            lane_info: lane::lane_info(current.as_ref()),
            waypoints: lane::lookahead(map, current.as_ref(), self.config.lookahead_step),
            vehicle_radar: radar::vehicle_radar(
                ego,
                &snapshot.vehicles,
                self.config.radar_radius,
                self.config.ttc_sentinel,
            ),
            traffic_light: environment::traffic_light(
                &transform.location,
                &snapshot.traffic_lights,
                self.config.traffic_light_radius,
                self.config.light_distance_sentinel,
            ),
            weather: environment::weather(&snapshot.weather),
            danger: danger::danger(ego, current.as_ref(), map, self.config.curvature_probe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::MockRoad;
    use contracts::{
        EgoState, Location, Rotation, Transform, Vector3, VehicleState, OBSERVATION_DIM,
    };

    fn snapshot(vehicle_count: usize) -> EngineSnapshot {
        let vehicles = (0..vehicle_count)
            .map(|i| {
                let angle = (i as f64 * 37.0).to_radians();
                let r = 5.0 + (i % 20) as f64 * 6.0;
                VehicleState {
                    actor_id: 100 + i as u32,
                    location: Location::new(r * angle.cos(), r * angle.sin(), 0.0),
                    velocity: Vector3::new(i as f64 % 3.0, 0.0, 0.0),
                }
            })
            .collect();
        EngineSnapshot {
            timestamp: 1.5,
            ego: EgoState {
                actor_id: 1,
                transform: Transform::new(Location::new(0.0, 0.5, 0.3), Rotation::default()),
                velocity: Vector3::new(2.0, 0.0, 0.0),
                ..Default::default()
            },
            vehicles,
            ..Default::default()
        }
    }

    #[test]
    fn test_shape_independent_of_scene_size() {
        let encoder = ObservationEncoder::default();
        let road = MockRoad::default();
        for count in [0, 1, 8, 50] {
            let obs = encoder.encode(&snapshot(count), &road);
            assert_eq!(obs.to_vec().len(), OBSERVATION_DIM, "count = {count}");
        }
    }

    #[test]
    fn test_off_map_degrades_to_zeros() {
        let encoder = ObservationEncoder::default();
        let road = MockRoad::default();
        let mut snap = snapshot(3);
        snap.ego.transform.location = Location::new(0.0, 80.0, 0.3);

        let obs = encoder.encode(&snap, &road);
        assert_eq!(obs.lane_info, [0.0; contracts::LANE_INFO_LEN]);
        assert_eq!(obs.danger, [0.0; contracts::DANGER_LEN]);
        assert!(obs.waypoints.iter().all(|w| *w == [0.0; 4]));
        assert_eq!(obs.traffic_light, [100.0, -1.0]);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let encoder = ObservationEncoder::default();
        let road = MockRoad::default();
        let snap = snapshot(8);
        assert_eq!(encoder.encode(&snap, &road), encoder.encode(&snap, &road));
    }

    #[test]
    fn test_kinematics_copied() {
        let encoder = ObservationEncoder::default();
        let road = MockRoad::default();
        let obs = encoder.encode(&snapshot(0), &road);
        assert_eq!(obs.timestamp, 1.5);
        assert_eq!(obs.velocity, [2.0, 0.0, 0.0]);
        assert_eq!(obs.location, [0.0, 0.5, 0.3]);
        assert!((obs.speed() - 2.0).abs() < 1e-6);
        assert!((obs.lane_deviation() - 0.5).abs() < 1e-6);
    }
}
