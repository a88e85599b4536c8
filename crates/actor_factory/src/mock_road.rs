//! Mock 道路图
//!
//! 一条沿 +x 方向的直线车道，可选一个分叉点。用于离线测试编码器和控制循环。

use contracts::{LaneChange, Location, RoadMap, Rotation, Transform, Waypoint};

/// 分叉支路相对主路的航向角 (度)
const BRANCH_YAW_DEG: f64 = 30.0;

/// 分叉点附近被视为路口的范围 (米)
const JUNCTION_RADIUS: f64 = 5.0;

/// 直线道路
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockRoad {
    /// 车道中心线的 y 坐标
    pub center_y: f64,
    /// 路面高度
    pub z: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub lane_width: f64,
    /// 分叉点 x 坐标
    pub fork_at: Option<f64>,
}

impl Default for MockRoad {
    fn default() -> Self {
        Self {
            center_y: 0.0,
            z: 0.0,
            x_start: -50.0,
            x_end: 500.0,
            lane_width: 3.5,
            fork_at: None,
        }
    }
}

impl MockRoad {
    fn near_fork(&self, x: f64) -> bool {
        self.fork_at
            .is_some_and(|fork| (x - fork).abs() <= JUNCTION_RADIUS)
    }

    fn on_main_road(&self, wp: &Waypoint) -> bool {
        (wp.transform.location.y - self.center_y).abs() < 1e-6 && wp.transform.rotation.yaw == 0.0
    }

    fn waypoint(&self, location: Location, yaw: f64, branch: u64) -> Waypoint {
        let junction = self.near_fork(location.x);
        Waypoint {
            id: (((location.x * 100.0).round() as i64 as u64) << 1) | branch,
            transform: Transform::new(location, Rotation::from_yaw(yaw)),
            lane_width: self.lane_width,
            is_junction: junction,
            is_intersection: junction,
            lane_change: if junction {
                LaneChange::None
            } else {
                LaneChange::Both
            },
            has_left_lane: !junction,
            has_right_lane: !junction,
        }
    }
}

impl RoadMap for MockRoad {
    fn nearest_waypoint(&self, location: &Location) -> Option<Waypoint> {
        let margin = self.lane_width * 2.0;
        if location.x < self.x_start - margin
            || location.x > self.x_end + margin
            || (location.y - self.center_y).abs() > margin
        {
            return None;
        }
        let x = location.x.clamp(self.x_start, self.x_end);
        Some(self.waypoint(Location::new(x, self.center_y, self.z), 0.0, 0))
    }

    fn next(&self, waypoint: &Waypoint, distance: f64) -> Vec<Waypoint> {
        let from = waypoint.transform.location;
        let yaw = waypoint.transform.rotation.yaw;
        let forward = waypoint.transform.forward_vector();
        let to = Location::new(
            from.x + forward.x * distance,
            from.y + forward.y * distance,
            from.z,
        );
        if to.x > self.x_end {
            return Vec::new();
        }

        let mut result = vec![self.waypoint(to, yaw, waypoint.id & 1)];

        if let Some(fork) = self.fork_at {
            if self.on_main_road(waypoint) && from.x < fork && to.x >= fork {
                let branch = BRANCH_YAW_DEG.to_radians();
                let past = to.x - fork;
                let split = Location::new(
                    fork + past * branch.cos(),
                    self.center_y + past * branch.sin(),
                    from.z,
                );
                result.push(self.waypoint(split, BRANCH_YAW_DEG, 1));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_waypoint_projects_onto_center() {
        let road = MockRoad::default();
        let wp = road
            .nearest_waypoint(&Location::new(12.0, 1.0, 0.5))
            .unwrap();
        assert_eq!(wp.transform.location.y, 0.0);
        assert_eq!(wp.transform.location.x, 12.0);
        assert_eq!(wp.lane_width, 3.5);
    }

    #[test]
    fn test_off_map() {
        let road = MockRoad::default();
        assert!(road.nearest_waypoint(&Location::new(0.0, 50.0, 0.0)).is_none());
    }

    #[test]
    fn test_next_walks_forward_and_ends() {
        let road = MockRoad {
            x_end: 20.0,
            ..Default::default()
        };
        let wp = road.nearest_waypoint(&Location::new(10.0, 0.0, 0.0)).unwrap();
        let next = road.next(&wp, 5.0);
        assert_eq!(next.len(), 1);
        assert!((next[0].transform.location.x - 15.0).abs() < 1e-9);

        let beyond = road.next(&next[0], 10.0);
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_fork_yields_two_branches_straight_first() {
        let road = MockRoad {
            fork_at: Some(20.0),
            ..Default::default()
        };
        let wp = road.nearest_waypoint(&Location::new(17.0, 0.0, 0.0)).unwrap();
        let next = road.next(&wp, 5.0);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].transform.rotation.yaw, 0.0);
        assert_eq!(next[1].transform.rotation.yaw, BRANCH_YAW_DEG);
        assert!(next[0].is_junction);
    }
}
