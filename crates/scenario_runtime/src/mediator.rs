//! 控制仲裁
//!
//! learned 模式把 agent 动作转成执行器命令；autopilot 模式交给引擎自带驾驶，此处不做任何事。

use actor_factory::SimClient;
use contracts::{Action, ActionCommand, ActorId, ControlMode, VehicleControl};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ControlMediator {
    mode: ControlMode,
}

impl ControlMediator {
    pub fn new(mode: ControlMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// 动作限幅后转成执行器控制量
    pub fn to_control(action: &Action) -> VehicleControl {
        VehicleControl {
            throttle: action.throttle.clamp(0.0, 1.0),
            steer: action.steer.clamp(-1.0, 1.0),
            brake: action.brake.clamp(0.0, 1.0),
            ..VehicleControl::default()
        }
    }

    /// 执行一个动作；autopilot 模式返回 None
    ///
    /// 执行器调用失败只记录日志。
    pub async fn apply<C: SimClient>(
        &self,
        client: &C,
        ego_id: ActorId,
        action: &Action,
    ) -> Option<ActionCommand> {
        if !self.mode.is_learned() {
            return None;
        }
        let command = ActionCommand {
            control: Self::to_control(action),
            mode: self.mode,
        };
        if let Err(e) = client.apply_control(ego_id, command.control).await {
            warn!(ego_id, error = %e, "apply control failed");
        }
        Some(command)
    }

    /// 切换控制模式，并把主车的自动驾驶标志设为 `!learned`
    ///
    /// 没有存活主车时只切换模式，下一轮 spawn 时生效。
    pub async fn toggle<C: SimClient>(&mut self, client: &C, ego_id: Option<ActorId>) -> ControlMode {
        self.mode = self.mode.toggled();
        if let Some(ego_id) = ego_id {
            let autopilot = !self.mode.is_learned();
            if let Err(e) = client.set_autopilot(ego_id, autopilot).await {
                warn!(ego_id, autopilot, error = %e, "failed to flip ego autopilot");
            }
        }
        info!(mode = %self.mode, "control mode toggled");
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::MockSimClient;
    use contracts::Transform;
    use std::time::Duration;

    async fn client_with_ego() -> (MockSimClient, ActorId) {
        let mut client = MockSimClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs(1))
            .await
            .unwrap();
        let ego = client
            .spawn_vehicle("vehicle.tesla.model3", Transform::default(), Some("ego"))
            .await
            .unwrap();
        (client, ego)
    }

    #[test]
    fn test_to_control_clamps() {
        let c = ControlMediator::to_control(&Action {
            throttle: 1.7,
            steer: -3.0,
            brake: -0.2,
        });
        assert_eq!((c.throttle, c.steer, c.brake), (1.0, -1.0, 0.0));
        assert!(!c.hand_brake && !c.reverse);
    }

    #[tokio::test]
    async fn test_apply_in_learned_mode_reaches_engine() {
        let (client, ego) = client_with_ego().await;
        let mediator = ControlMediator::new(ControlMode::Learned);
        let action = Action {
            throttle: 0.6,
            steer: 0.1,
            brake: 0.0,
        };

        let command = mediator.apply(&client, ego, &action).await.unwrap();
        assert_eq!(command.mode, ControlMode::Learned);
        assert_eq!(client.vehicle_control(ego).unwrap().throttle, 0.6);
    }

    #[tokio::test]
    async fn test_apply_in_autopilot_mode_is_noop() {
        let (client, ego) = client_with_ego().await;
        let mediator = ControlMediator::new(ControlMode::Autopilot);

        assert!(mediator.apply(&client, ego, &Action::default()).await.is_none());
        assert!(!client
            .events()
            .iter()
            .any(|e| matches!(e, actor_factory::MockEvent::ControlApplied(_))));
    }

    #[tokio::test]
    async fn test_toggle_flips_engine_autopilot() {
        let (client, ego) = client_with_ego().await;
        let mut mediator = ControlMediator::new(ControlMode::Learned);

        assert_eq!(mediator.toggle(&client, Some(ego)).await, ControlMode::Autopilot);
        assert_eq!(client.is_autopilot(ego), Some(true));

        assert_eq!(mediator.toggle(&client, Some(ego)).await, ControlMode::Learned);
        assert_eq!(client.is_autopilot(ego), Some(false));
    }

    #[tokio::test]
    async fn test_toggle_without_ego_only_changes_mode() {
        let client = MockSimClient::new();
        let mut mediator = ControlMediator::new(ControlMode::Autopilot);
        assert_eq!(mediator.toggle(&client, None).await, ControlMode::Learned);
        assert!(client.events().is_empty());
    }
}
