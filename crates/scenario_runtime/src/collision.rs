//! 碰撞事件收件箱
//!
//! 传感器回调运行在引擎线程上，只把事件放进单消费者通道；
//! 去抖和奖励计算都在 tick 循环里完成，没有跨线程共享的可变状态。

use contracts::{CollisionCallback, CollisionEvent};
use std::sync::Arc;
use tracing::{trace, warn};

/// 创建回调与对应的收件箱
pub fn collision_channel() -> (CollisionCallback, CollisionInbox) {
    let (tx, rx) = async_channel::unbounded();
    let callback: CollisionCallback = Arc::new(move |event: CollisionEvent| {
        if tx.try_send(event).is_err() {
            warn!(
                other_actor_id = event.other_actor_id,
                "collision inbox closed, event dropped"
            );
        }
    });
    (callback, CollisionInbox { rx })
}

pub struct CollisionInbox {
    rx: async_channel::Receiver<CollisionEvent>,
}

impl CollisionInbox {
    /// 取出当前排队的全部事件 (不等待)
    pub fn drain(&self) -> Vec<CollisionEvent> {
        let mut events = Vec::with_capacity(self.rx.len());
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        if !events.is_empty() {
            trace!(count = events.len(), "collision events drained");
        }
        events
    }
}

/// 碰撞去抖：同一次事故的连续接触只计一次
#[derive(Debug, Clone)]
pub struct CollisionDebouncer {
    cooldown: f64,
    last_accepted: Option<f64>,
}

impl CollisionDebouncer {
    pub fn new(cooldown_sec: f64) -> Self {
        Self {
            cooldown: cooldown_sec,
            last_accepted: None,
        }
    }

    /// 距上次接受的事件严格超过冷却时间才接受，并更新时间戳
    pub fn accept(&mut self, timestamp: f64) -> bool {
        let accepted = self
            .last_accepted
            .is_none_or(|last| timestamp - last > self.cooldown);
        if accepted {
            self.last_accepted = Some(timestamp);
        }
        accepted
    }
}
