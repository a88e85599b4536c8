//! 交通灯与天气

use contracts::{Location, TrafficLightInfo, WeatherState, TRAFFIC_LIGHT_LEN, WEATHER_LEN};

/// 无信号灯时的状态编码
const NO_LIGHT_STATE: f32 = -1.0;

/// (最近信号灯距离, 状态)，半径内没有信号灯时为 (sentinel, -1)
pub fn traffic_light(
    ego: &Location,
    lights: &[TrafficLightInfo],
    radius: f64,
    sentinel: f64,
) -> [f32; TRAFFIC_LIGHT_LEN] {
    lights
        .iter()
        .map(|light| (ego.distance(&light.location), light))
        .filter(|(d, _)| *d < radius)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map_or([sentinel as f32, NO_LIGHT_STATE], |(d, light)| {
            [d as f32, light.state.code()]
        })
}

pub fn weather(w: &WeatherState) -> [f32; WEATHER_LEN] {
    [
        w.cloudiness as f32,
        w.precipitation as f32,
        w.precipitation_deposits as f32,
        w.wind_intensity as f32,
        w.fog_density as f32,
        w.wetness as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LightState;

    fn light(id: u32, x: f64, state: LightState) -> TrafficLightInfo {
        TrafficLightInfo {
            actor_id: id,
            location: Location::new(x, 0.0, 0.0),
            state,
        }
    }

    #[test]
    fn test_nearest_light_within_radius() {
        let lights = [
            light(1, 40.0, LightState::Green),
            light(2, 15.0, LightState::Red),
            light(3, 80.0, LightState::Yellow),
        ];
        let encoded = traffic_light(&Location::default(), &lights, 50.0, 100.0);
        assert_eq!(encoded, [15.0, LightState::Red.code()]);
    }

    #[test]
    fn test_no_light_sentinel() {
        let lights = [light(1, 60.0, LightState::Green)];
        let encoded = traffic_light(&Location::default(), &lights, 50.0, 100.0);
        assert_eq!(encoded, [100.0, -1.0]);
        assert_eq!(
            traffic_light(&Location::default(), &[], 50.0, 100.0),
            [100.0, -1.0]
        );
    }

    #[test]
    fn test_weather_passthrough() {
        let w = WeatherState {
            cloudiness: 10.0,
            precipitation: 20.0,
            precipitation_deposits: 30.0,
            wind_intensity: 40.0,
            fog_density: 50.0,
            wetness: 60.0,
        };
        assert_eq!(weather(&w), [10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
    }
}
