//! 几何基础类型
//!
//! 与仿真引擎坐标系一致：位置单位米，角度单位度，左手系 (x 前, y 右, z 上)。

use serde::{Deserialize, Serialize};

/// 3D 变换：位置 + 旋转
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z) 单位：米
    pub location: Location,

    /// 旋转 (pitch, yaw, roll) 单位：度
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// 前向单位向量 (由 pitch/yaw 计算)
    pub fn forward_vector(&self) -> Vector3 {
        let pitch = self.rotation.pitch.to_radians();
        let yaw = self.rotation.yaw.to_radians();
        Vector3 {
            x: pitch.cos() * yaw.cos(),
            y: pitch.cos() * yaw.sin(),
            z: pitch.sin(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 欧氏距离
    pub fn distance(&self, other: &Location) -> f64 {
        self.delta(other).length()
    }

    /// 平面 (x, y) 距离
    pub fn distance_2d(&self, other: &Location) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// `other - self`
    pub fn delta(&self, other: &Location) -> Vector3 {
        Vector3 {
            x: other.x - self.x,
            y: other.y - self.y,
            z: other.z - self.z,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    /// 仅指定 yaw 的旋转
    pub fn from_yaw(yaw: f64) -> Self {
        Self {
            pitch: 0.0,
            yaw,
            roll: 0.0,
        }
    }
}

/// 3D 向量 (速度 m/s、加速度 m/s²、角速度 deg/s)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_vector_yaw() {
        let t = Transform::new(Location::default(), Rotation::from_yaw(90.0));
        let f = t.forward_vector();
        assert!(f.x.abs() < 1e-9);
        assert!((f.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance() {
        let a = Location::new(0.0, 0.0, 0.0);
        let b = Location::new(3.0, 4.0, 12.0);
        assert!((a.distance(&b) - 13.0).abs() < 1e-9);
        assert!((a.distance_2d(&b) - 5.0).abs() < 1e-9);
    }
}
