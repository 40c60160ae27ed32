use std::collections::{HashMap, VecDeque};

use crate::pose::{dist_between, Keypoint, KeypointName, Pose};

/// マッチング距離で考慮する信頼度閾値
pub const MATCH_CONFIDENCE: f32 = 0.5;

/// ウィンドウ採用の信頼度フロア。これ未満のキーポイントは欠損として
/// 扱い、ギャップフィルの対象になる。
pub const ADMIT_CONFIDENCE: f32 = 0.05;

/// 1キーポイント分の移動平均ウィンドウ
pub struct FeatureSmoother {
    window: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl FeatureSmoother {
    fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, position: (f32, f32)) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(position);
    }

    /// ウィンドウ内のサンプル数
    pub fn num(&self) -> usize {
        self.window.len()
    }

    /// ウィンドウ平均。サンプルがなければ None。
    pub fn smoothed(&self) -> Option<(f32, f32)> {
        if self.window.is_empty() {
            return None;
        }
        let n = self.window.len() as f32;
        let (sx, sy) = self
            .window
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        Some((sx / n, sy / n))
    }
}

/// 1人分のトラッカー
///
/// キーポイントごとの移動平均ウィンドウと最終採用値（ギャップフィル用）を
/// 持つ。ウィンドウと last_accepted はトラッカーごとに独立で、複数人を
/// 同時に追跡しても履歴が混ざらない。
pub struct PoseSmoother {
    name: String,
    window_size: usize,
    smoothers: HashMap<KeypointName, FeatureSmoother>,
    last_accepted: HashMap<KeypointName, Keypoint>,
}

impl PoseSmoother {
    pub fn new(name: impl Into<String>, window_size: usize) -> Self {
        Self {
            name: name.into(),
            window_size: window_size.max(1),
            smoothers: HashMap::new(),
            last_accepted: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// ポーズを採用して平滑化する
    ///
    /// キーポイントごとに:
    /// - 欠損（不在または信頼度フロア未満）なら last_accepted で代替。
    ///   一度も観測していないキーポイントは欠損のまま。
    /// - 採用値（代替込み）をウィンドウへ追加し last_accepted を更新。
    /// - ポーズ側の座標をウィンドウ平均で書き換える。代替したキー
    ///   ポイントはポーズへ挿入され、1フレームの欠落が穴にならない。
    pub fn smooth(&mut self, pose: &mut Pose) {
        let window_size = self.window_size;
        for name in KeypointName::ALL {
            let incoming = pose
                .get(name)
                .filter(|kp| kp.is_valid(ADMIT_CONFIDENCE))
                .copied();

            let accepted = match incoming {
                Some(kp) => kp,
                None => match self.last_accepted.get(&name) {
                    Some(prev) => *prev,
                    None => continue,
                },
            };

            let smoother = self
                .smoothers
                .entry(name)
                .or_insert_with(|| FeatureSmoother::new(window_size));
            smoother.push(accepted.position());
            self.last_accepted.insert(name, accepted);

            let (sx, sy) = smoother.smoothed().unwrap_or(accepted.position());
            match pose.get_mut(name) {
                Some(kp) => {
                    kp.x = sx;
                    kp.y = sy;
                }
                None => {
                    pose.keypoints
                        .push(Keypoint::new(name, sx, sy, accepted.score));
                }
            }
        }
    }

    /// 現在の推定位置。観測したことがなければ None。
    pub fn smoothed(&self, name: KeypointName) -> Option<(f32, f32)> {
        self.smoothers.get(&name).and_then(|s| s.smoothed())
    }

    pub fn sample_count(&self, name: KeypointName) -> usize {
        self.smoothers.get(&name).map_or(0, |s| s.num())
    }

    pub fn last_accepted(&self, name: KeypointName) -> Option<&Keypoint> {
        self.last_accepted.get(&name)
    }

    /// 入力ポーズとの平均距離
    ///
    /// 双方が閾値以上の信頼度で観測しているキーポイントのみで定義。
    /// 共通キーポイントがなければ None（マッチング候補から除外される）。
    pub fn distance_to(&self, pose: &Pose) -> Option<f32> {
        let mut sum = 0.0;
        let mut n = 0usize;
        for kp in pose.keypoints.iter().filter(|k| k.is_valid(MATCH_CONFIDENCE)) {
            let Some(smoothed) = self.smoothed(kp.name) else {
                continue;
            };
            sum += dist_between(kp.position(), smoothed);
            n += 1;
        }
        if n == 0 {
            None
        } else {
            Some(sum / n as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(name: KeypointName, x: f32, y: f32, score: f32) -> Keypoint {
        Keypoint::new(name, x, y, score)
    }

    #[test]
    fn test_feature_smoother_windowed_mean() {
        let mut s = FeatureSmoother::new(3);
        s.push((0.0, 0.0));
        s.push((2.0, 4.0));
        assert_eq!(s.num(), 2);
        assert_eq!(s.smoothed(), Some((1.0, 2.0)));
    }

    #[test]
    fn test_feature_smoother_evicts_oldest() {
        let mut s = FeatureSmoother::new(2);
        s.push((100.0, 100.0));
        s.push((2.0, 2.0));
        s.push((4.0, 4.0));
        // (100,100) は追い出されている
        assert_eq!(s.num(), 2);
        assert_eq!(s.smoothed(), Some((3.0, 3.0)));
    }

    #[test]
    fn test_smooth_writes_back_windowed_mean() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut pose1 = Pose::new(0.9, vec![kp(KeypointName::Nose, 0.0, 0.0, 0.9)]);
        smoother.smooth(&mut pose1);

        let mut pose2 = Pose::new(0.9, vec![kp(KeypointName::Nose, 10.0, 10.0, 0.9)]);
        smoother.smooth(&mut pose2);
        let nose = pose2.get(KeypointName::Nose).unwrap();
        assert_eq!((nose.x, nose.y), (5.0, 5.0));
    }

    #[test]
    fn test_gap_fill_substitutes_last_accepted() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut pose1 = Pose::new(0.9, vec![kp(KeypointName::LeftWrist, 10.0, 10.0, 0.9)]);
        smoother.smooth(&mut pose1);

        // 次のポーズは LeftWrist を欠いている
        let mut pose2 = Pose::new(0.9, vec![kp(KeypointName::Nose, 0.0, 0.0, 0.9)]);
        smoother.smooth(&mut pose2);

        // last_accepted は (10,10) のまま
        let last = smoother.last_accepted(KeypointName::LeftWrist).unwrap();
        assert_eq!((last.x, last.y), (10.0, 10.0));
        // ポーズへ代替キーポイントが挿入されている
        let filled = pose2.get(KeypointName::LeftWrist).unwrap();
        assert_eq!((filled.x, filled.y), (10.0, 10.0));
    }

    #[test]
    fn test_low_confidence_treated_as_missing() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut pose1 = Pose::new(0.9, vec![kp(KeypointName::LeftWrist, 10.0, 10.0, 0.9)]);
        smoother.smooth(&mut pose1);

        let mut pose2 = Pose::new(0.9, vec![kp(KeypointName::LeftWrist, 99.0, 99.0, 0.01)]);
        smoother.smooth(&mut pose2);

        // フロア未満の観測は採用されず、前回値が維持される
        let last = smoother.last_accepted(KeypointName::LeftWrist).unwrap();
        assert_eq!((last.x, last.y), (10.0, 10.0));
    }

    #[test]
    fn test_never_observed_stays_absent() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut pose = Pose::new(0.9, vec![kp(KeypointName::Nose, 0.0, 0.0, 0.9)]);
        smoother.smooth(&mut pose);

        assert!(pose.get(KeypointName::RightAnkle).is_none());
        assert_eq!(smoother.sample_count(KeypointName::RightAnkle), 0);
        assert!(smoother.smoothed(KeypointName::RightAnkle).is_none());
    }

    #[test]
    fn test_distance_to_mean_over_shared_keypoints() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut seed = Pose::new(
            0.9,
            vec![
                kp(KeypointName::Nose, 0.0, 0.0, 0.9),
                kp(KeypointName::LeftHip, 10.0, 0.0, 0.9),
            ],
        );
        smoother.smooth(&mut seed);

        let probe = Pose::new(
            0.9,
            vec![
                kp(KeypointName::Nose, 3.0, 4.0, 0.9),   // 距離 5
                kp(KeypointName::LeftHip, 10.0, 1.0, 0.9), // 距離 1
                kp(KeypointName::RightAnkle, 0.0, 0.0, 0.9), // 未観測 → 対象外
            ],
        );
        let d = smoother.distance_to(&probe).unwrap();
        assert!((d - 3.0).abs() < 1e-6, "expected mean 3.0, got {}", d);
    }

    #[test]
    fn test_distance_to_none_without_overlap() {
        let mut smoother = PoseSmoother::new("smoother_0", 4);
        let mut seed = Pose::new(0.9, vec![kp(KeypointName::Nose, 0.0, 0.0, 0.9)]);
        smoother.smooth(&mut seed);

        // 共通キーポイントなし
        let probe = Pose::new(0.9, vec![kp(KeypointName::LeftAnkle, 1.0, 1.0, 0.9)]);
        assert!(smoother.distance_to(&probe).is_none());

        // 共通だが信頼度が閾値以下
        let weak = Pose::new(0.9, vec![kp(KeypointName::Nose, 1.0, 1.0, 0.3)]);
        assert!(smoother.distance_to(&weak).is_none());
    }
}
