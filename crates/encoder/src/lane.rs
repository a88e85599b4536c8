//! 车道几何与路点前视

use contracts::{
    LaneChange, RoadMap, Waypoint, LANE_INFO_LEN, LOOKAHEAD_STEPS, WAYPOINT_FEATURES,
};

fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// lane_width, is_junction, is_intersection, change_left, change_right,
/// change_both, has_left_lane, has_right_lane
///
/// 无法解析当前路点时全零。
pub fn lane_info(current: Option<&Waypoint>) -> [f32; LANE_INFO_LEN] {
    let Some(wp) = current else {
        return [0.0; LANE_INFO_LEN];
    };
    [
        wp.lane_width as f32,
        flag(wp.is_junction),
        flag(wp.is_intersection),
        flag(wp.lane_change == LaneChange::Left),
        flag(wp.lane_change == LaneChange::Right),
        flag(wp.lane_change == LaneChange::Both),
        flag(wp.has_left_lane),
        flag(wp.has_right_lane),
    ]
}

/// 沿路网向前走 [`LOOKAHEAD_STEPS`] 步，每步 `step` 米
///
/// 分叉处总是取 `next` 返回的第一条分支。路网提前结束时剩余行补零。
pub fn lookahead(
    map: &dyn RoadMap,
    current: Option<&Waypoint>,
    step: f64,
) -> [[f32; WAYPOINT_FEATURES]; LOOKAHEAD_STEPS] {
    let mut out = [[0.0; WAYPOINT_FEATURES]; LOOKAHEAD_STEPS];
    let Some(start) = current else {
        return out;
    };

    let mut cursor = *start;
    for slot in out.iter_mut() {
        let Some(next) = map.next(&cursor, step).into_iter().next() else {
            break;
        };
        let loc = next.transform.location;
        *slot = [
            loc.x as f32,
            loc.y as f32,
            loc.z as f32,
            next.transform.rotation.yaw as f32,
        ];
        cursor = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_factory::MockRoad;
    use contracts::Location;

    #[test]
    fn test_lane_info_layout() {
        let road = MockRoad::default();
        let wp = road.nearest_waypoint(&Location::new(10.0, 0.0, 0.0));
        let info = lane_info(wp.as_ref());
        assert_eq!(info, [3.5, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_lane_info_missing_waypoint() {
        assert_eq!(lane_info(None), [0.0; LANE_INFO_LEN]);
    }

    #[test]
    fn test_lookahead_spacing() {
        let road = MockRoad::default();
        let wp = road.nearest_waypoint(&Location::new(0.0, 0.0, 0.0));
        let steps = lookahead(&road, wp.as_ref(), 5.0);
        for (i, row) in steps.iter().enumerate() {
            assert!((row[0] - 5.0 * (i + 1) as f32).abs() < 1e-4);
            assert_eq!(row[3], 0.0);
        }
    }

    #[test]
    fn test_lookahead_takes_first_branch() {
        let road = MockRoad {
            fork_at: Some(12.0),
            ..Default::default()
        };
        let wp = road.nearest_waypoint(&Location::new(0.0, 0.0, 0.0));
        let steps = lookahead(&road, wp.as_ref(), 5.0);
        // 第一条分支是直行
        assert!(steps.iter().all(|row| row[1] == 0.0 && row[3] == 0.0));
    }

    #[test]
    fn test_lookahead_zero_fills_past_road_end() {
        let road = MockRoad {
            x_end: 20.0,
            ..Default::default()
        };
        let wp = road.nearest_waypoint(&Location::new(0.0, 0.0, 0.0));
        let steps = lookahead(&road, wp.as_ref(), 5.0);
        assert!((steps[3][0] - 20.0).abs() < 1e-4);
        assert_eq!(steps[4], [0.0; WAYPOINT_FEATURES]);
        assert_eq!(steps[9], [0.0; WAYPOINT_FEATURES]);
    }
}
