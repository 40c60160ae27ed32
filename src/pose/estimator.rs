use anyhow::Result;
use serde::Deserialize;

use super::adapt::RawPose;
use crate::source::VideoSource;

/// 検出モード（単人/複数人）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    Single,
    Multi,
}

impl DetectionMode {
    /// 推定器へ渡す最大検出人数
    pub fn max_poses(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Multi => 6,
        }
    }
}

impl Default for DetectionMode {
    fn default() -> Self {
        Self::Single
    }
}

/// 姿勢推定器のシーム
///
/// 実体は外部コラボレーター（ONNX ランタイム等）。この呼び出しが
/// ティック内唯一のサスペンションポイントで、完了までブロックする。
/// 0件の検出はエラーではない。
pub trait PoseEstimator {
    fn estimate(&mut self, source: &mut dyn VideoSource, max_poses: usize)
        -> Result<Vec<RawPose>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_poses() {
        assert_eq!(DetectionMode::Single.max_poses(), 1);
        assert_eq!(DetectionMode::Multi.max_poses(), 6);
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let mode: DetectionMode = serde_json::from_str("\"multi\"").unwrap();
        assert_eq!(mode, DetectionMode::Multi);
    }
}
