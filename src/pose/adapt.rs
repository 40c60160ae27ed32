use serde::{Deserialize, Serialize};

use super::keypoint::{Keypoint, KeypointName, Pose};

/// 推定器が返す生キーポイント（関節名は MoveNet の snake_case）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawKeypoint {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// 推定器が返す生ポーズ
///
/// 全体スコアを持たないモデルもあるため score は Option。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPose {
    pub score: Option<f32>,
    pub keypoints: Vec<RawKeypoint>,
}

/// 生キーポイント列を内部表現へ変換する
///
/// 未知の関節名は破棄（警告ログのみ）。同名の重複は最初の1つを採用する。
pub fn adapt_keypoints(raw: &[RawKeypoint]) -> Vec<Keypoint> {
    let mut keypoints: Vec<Keypoint> = Vec::with_capacity(raw.len());
    for kp in raw {
        let name = match KeypointName::from_name(&kp.name) {
            Some(name) => name,
            None => {
                log::warn!("unknown keypoint name {:?}, dropping", kp.name);
                continue;
            }
        };
        if keypoints.iter().any(|existing| existing.name == name) {
            log::warn!("duplicate keypoint {:?}, keeping the first", kp.name);
            continue;
        }
        keypoints.push(Keypoint::new(name, kp.x, kp.y, kp.score));
    }
    keypoints
}

/// 生ポーズを内部表現へ変換する
///
/// 全体スコアがなければキーポイントスコアの平均で代用する。
pub fn adapt_pose(raw: &RawPose) -> Pose {
    let keypoints = adapt_keypoints(&raw.keypoints);
    let score = raw.score.unwrap_or_else(|| {
        if raw.keypoints.is_empty() {
            0.0
        } else {
            raw.keypoints.iter().map(|k| k.score).sum::<f32>() / raw.keypoints.len() as f32
        }
    });
    Pose::new(score, keypoints)
}
