use std::cmp::Ordering;

use crate::pose::Pose;

use super::smoother::PoseSmoother;

/// (ポーズ, トラッカー) 候補ペア
struct CandidatePair {
    pose_index: usize,
    smoother_index: usize,
    dist: Option<f32>,
}

/// フレーム間のトラッカー割り当て
///
/// 毎ティック、検出ポーズと生存トラッカーの全ペアを距離昇順に並べ、
/// 貪欲に確定していく。最小コスト割り当てではないが、ポーズ数が
/// 少ない用途では十分で単純。
pub struct TrackerAssignment {
    smoothers: Vec<PoseSmoother>,
    window_size: usize,
    next_id: u64,
}

impl TrackerAssignment {
    pub fn new(window_size: usize) -> Self {
        Self {
            smoothers: Vec::new(),
            window_size,
            next_id: 0,
        }
    }

    /// 生存トラッカー数
    pub fn tracker_count(&self) -> usize {
        self.smoothers.len()
    }

    /// 生存トラッカー名の一覧
    pub fn tracker_names(&self) -> Vec<&str> {
        self.smoothers.iter().map(|s| s.name()).collect()
    }

    /// 1ティック分の割り当てを行う
    ///
    /// 各ポーズは確定したトラッカーの smooth() を通り、座標が平滑化
    /// される。戻り値はポーズごとのトラッカーIDで、入力と同順。
    /// 確定しなかったトラッカーは破棄、確定しなかったポーズは新規
    /// トラッカーを生成する。IDは単調カウンタ由来で、一度破棄された
    /// IDが再利用されることはない。
    pub fn assign(&mut self, poses: &mut [Pose]) -> Vec<String> {
        let mut pairs = Vec::with_capacity(poses.len() * self.smoothers.len());
        for (pose_index, pose) in poses.iter().enumerate() {
            for (smoother_index, smoother) in self.smoothers.iter().enumerate() {
                pairs.push(CandidatePair {
                    pose_index,
                    smoother_index,
                    dist: smoother.distance_to(pose),
                });
            }
        }

        // 距離昇順、未定義距離は最後（安定ソートで列挙順のタイブレーク）
        pairs.sort_by(|a, b| match (a.dist, b.dist) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let mut assigned: Vec<Option<String>> = vec![None; poses.len()];
        let mut used_smoothers = vec![false; self.smoothers.len()];
        for pair in &pairs {
            if assigned[pair.pose_index].is_some() || used_smoothers[pair.smoother_index] {
                continue;
            }
            let smoother = &mut self.smoothers[pair.smoother_index];
            smoother.smooth(&mut poses[pair.pose_index]);
            assigned[pair.pose_index] = Some(smoother.name().to_string());
            used_smoothers[pair.smoother_index] = true;
        }

        // 今ティックで確定しなかったトラッカーは破棄
        let mut index = 0;
        self.smoothers.retain(|s| {
            let keep = used_smoothers[index];
            if !keep {
                log::debug!("dropping tracker {}", s.name());
            }
            index += 1;
            keep
        });

        // 確定しなかったポーズは新規トラッカーを生成
        let mut result = Vec::with_capacity(poses.len());
        for (pose_index, slot) in assigned.into_iter().enumerate() {
            match slot {
                Some(name) => result.push(name),
                None => {
                    let name = format!("smoother_{}", self.next_id);
                    self.next_id += 1;
                    let mut smoother = PoseSmoother::new(name.clone(), self.window_size);
                    smoother.smooth(&mut poses[pose_index]);
                    self.smoothers.push(smoother);
                    result.push(name);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Keypoint, KeypointName};

    fn pose_at(x: f32, y: f32) -> Pose {
        Pose::new(
            0.9,
            vec![
                Keypoint::new(KeypointName::Nose, x, y, 0.9),
                Keypoint::new(KeypointName::LeftHip, x, y + 50.0, 0.9),
            ],
        )
    }

    #[test]
    fn test_first_tick_spawns_trackers() {
        let mut assignment = TrackerAssignment::new(4);
        let mut poses = vec![pose_at(0.0, 0.0), pose_at(100.0, 100.0)];
        let ids = assignment.assign(&mut poses);
        assert_eq!(ids, vec!["smoother_0", "smoother_1"]);
        assert_eq!(assignment.tracker_count(), 2);
    }

    #[test]
    fn test_matching_is_exclusive() {
        let mut assignment = TrackerAssignment::new(4);
        let mut poses = vec![pose_at(0.0, 0.0), pose_at(100.0, 100.0)];
        assignment.assign(&mut poses);

        // 両ポーズが同じトラッカーの近くにいても 1:1 を保つ
        let mut next = vec![pose_at(1.0, 0.0), pose_at(2.0, 0.0)];
        let ids = assignment.assign(&mut next);
        assert_ne!(ids[0], ids[1], "two poses must not share a tracker");
    }

    #[test]
    fn test_strictly_smallest_pair_wins() {
        let mut assignment = TrackerAssignment::new(4);
        let mut poses = vec![pose_at(0.0, 0.0)];
        let ids = assignment.assign(&mut poses);
        let first = ids[0].clone();

        // (pose, tracker) が他のどのペアよりも近ければ必ずそのペアが確定する
        let mut next = vec![pose_at(2.0, 0.0), pose_at(500.0, 500.0)];
        let ids = assignment.assign(&mut next);
        assert_eq!(ids[0], first);
        assert_ne!(ids[1], first);
    }

    #[test]
    fn test_cross_distance_scenario_preserves_ids() {
        let mut assignment = TrackerAssignment::new(4);
        let mut seed = vec![pose_at(1.0, 1.0), pose_at(99.0, 101.0)];
        let seed_ids = assignment.assign(&mut seed);

        // (0,0) は (1,1) のトラッカーへ、(100,100) は (99,101) のトラッカーへ
        let mut next = vec![pose_at(0.0, 0.0), pose_at(100.0, 100.0)];
        let ids = assignment.assign(&mut next);
        assert_eq!(ids[0], seed_ids[0], "ids must be preserved, not swapped");
        assert_eq!(ids[1], seed_ids[1], "ids must be preserved, not swapped");
    }

    #[test]
    fn test_unmatched_tracker_is_dropped() {
        let mut assignment = TrackerAssignment::new(4);
        let mut seed = vec![pose_at(0.0, 0.0), pose_at(100.0, 100.0)];
        assignment.assign(&mut seed);
        assert_eq!(assignment.tracker_count(), 2);

        // ポーズが1つしか来なければトラッカーも1つに減る
        let mut next = vec![pose_at(1.0, 1.0)];
        assignment.assign(&mut next);
        assert_eq!(assignment.tracker_count(), 1);
    }

    #[test]
    fn test_dropped_id_is_never_reused() {
        let mut assignment = TrackerAssignment::new(4);
        let mut seed = vec![pose_at(0.0, 0.0)];
        assert_eq!(assignment.assign(&mut seed), vec!["smoother_0"]);

        // 空ティックで smoother_0 が破棄される
        let mut empty: Vec<Pose> = vec![];
        assignment.assign(&mut empty);
        assert_eq!(assignment.tracker_count(), 0);

        // 新しいポーズは新しいIDを得る
        let mut next = vec![pose_at(0.0, 0.0)];
        let ids = assignment.assign(&mut next);
        assert_eq!(ids, vec!["smoother_1"]);
    }

    #[test]
    fn test_no_overlap_pair_confirmed_last() {
        let mut assignment = TrackerAssignment::new(4);
        let mut seed = vec![Pose::new(
            0.9,
            vec![Keypoint::new(KeypointName::Nose, 0.0, 0.0, 0.9)],
        )];
        let seed_ids = assignment.assign(&mut seed);

        // 共通キーポイントがなく距離は未定義だが、他に候補がなければ確定する
        let mut next = vec![Pose::new(
            0.9,
            vec![Keypoint::new(KeypointName::LeftAnkle, 50.0, 50.0, 0.9)],
        )];
        let ids = assignment.assign(&mut next);
        assert_eq!(ids, seed_ids);
    }

    #[test]
    fn test_assignment_smooths_poses() {
        let mut assignment = TrackerAssignment::new(4);
        let mut seed = vec![pose_at(0.0, 0.0)];
        assignment.assign(&mut seed);

        let mut next = vec![pose_at(10.0, 0.0)];
        assignment.assign(&mut next);
        // ウィンドウ平均 (0+10)/2 = 5 が書き戻されている
        let nose = next[0].get(KeypointName::Nose).unwrap();
        assert_eq!(nose.x, 5.0);
    }
}
