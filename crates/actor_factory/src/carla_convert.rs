//! CARLA 类型转换
//!
//! 将 carla-rust 的几何、控制与环境类型转换为 contracts 类型。
//! 仅在 `real-carla` feature 启用时编译。

use carla::geom::{Location as CarlaLocation, Rotation as CarlaRotation, Transform as CarlaTransform};
use carla::rpc::{TrafficLightState, VehicleControl as CarlaVehicleControl, WeatherParameters};
use contracts::{
    LightState, Location, Rotation, Transform, Vector3, VehicleControl, WeatherState,
};

/// Convert internal Transform to CARLA Transform
pub fn to_carla_transform(transform: &Transform) -> CarlaTransform {
    CarlaTransform {
        location: to_carla_location(&transform.location),
        rotation: CarlaRotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        },
    }
}

pub fn to_carla_location(location: &Location) -> CarlaLocation {
    CarlaLocation {
        x: location.x as f32,
        y: location.y as f32,
        z: location.z as f32,
    }
}

pub fn from_carla_location(location: &CarlaLocation) -> Location {
    Location::new(location.x as f64, location.y as f64, location.z as f64)
}

pub fn from_carla_transform(transform: &CarlaTransform) -> Transform {
    Transform::new(
        from_carla_location(&transform.location),
        Rotation {
            pitch: transform.rotation.pitch as f64,
            yaw: transform.rotation.yaw as f64,
            roll: transform.rotation.roll as f64,
        },
    )
}

/// carla 的 Vector3D 字段均为 f32
pub fn from_carla_vector(x: f32, y: f32, z: f32) -> Vector3 {
    Vector3::new(x as f64, y as f64, z as f64)
}

pub fn to_carla_control(control: &VehicleControl) -> CarlaVehicleControl {
    CarlaVehicleControl {
        throttle: control.throttle,
        steer: control.steer,
        brake: control.brake,
        hand_brake: control.hand_brake,
        reverse: control.reverse,
        manual_gear_shift: control.manual_gear_shift,
        gear: control.gear,
    }
}

pub fn from_carla_control(control: &CarlaVehicleControl) -> VehicleControl {
    VehicleControl {
        throttle: control.throttle,
        steer: control.steer,
        brake: control.brake,
        hand_brake: control.hand_brake,
        reverse: control.reverse,
        manual_gear_shift: control.manual_gear_shift,
        gear: control.gear,
    }
}

pub fn from_carla_light_state(state: TrafficLightState) -> LightState {
    match state {
        TrafficLightState::Red => LightState::Red,
        TrafficLightState::Yellow => LightState::Yellow,
        TrafficLightState::Green => LightState::Green,
        TrafficLightState::Off => LightState::Off,
        _ => LightState::Unknown,
    }
}

pub fn from_carla_weather(weather: &WeatherParameters) -> WeatherState {
    WeatherState {
        cloudiness: weather.cloudiness as f64,
        precipitation: weather.precipitation as f64,
        precipitation_deposits: weather.precipitation_deposits as f64,
        wind_intensity: weather.wind_intensity as f64,
        fog_density: weather.fog_density as f64,
        wetness: weather.wetness as f64,
    }
}
