//! 运动学与执行器状态编码

use contracts::{EgoState, Vector3, CONTROL_STATE_LEN, WHEEL_COUNT};

pub(crate) fn vec3(v: &Vector3) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}

/// throttle, steer, brake, hand_brake, reverse
pub fn control_state(ego: &EgoState) -> [f32; CONTROL_STATE_LEN] {
    let c = &ego.control;
    [
        c.throttle,
        c.steer,
        c.brake,
        f32::from(u8::from(c.hand_brake)),
        f32::from(u8::from(c.reverse)),
    ]
}

/// 车轮位置，多余的截断，不足的补零
pub fn wheel_positions(ego: &EgoState) -> [[f32; 3]; WHEEL_COUNT] {
    let mut out = [[0.0; 3]; WHEEL_COUNT];
    for (slot, wheel) in out.iter_mut().zip(&ego.wheel_positions) {
        *slot = [wheel.x as f32, wheel.y as f32, wheel.z as f32];
    }
    out
}
