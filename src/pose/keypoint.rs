use serde::{Deserialize, Serialize};

/// MoveNet の 17 キーポイント名
///
/// シリアライズは PoseNet 互換の camelCase 名（`"leftShoulder"` など）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    pub const COUNT: usize = 17;

    pub const ALL: [KeypointName; Self::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// 推定器の snake_case 名・camelCase 名のどちらからでも解決する
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nose" => Some(Self::Nose),
            "left_eye" | "leftEye" => Some(Self::LeftEye),
            "right_eye" | "rightEye" => Some(Self::RightEye),
            "left_ear" | "leftEar" => Some(Self::LeftEar),
            "right_ear" | "rightEar" => Some(Self::RightEar),
            "left_shoulder" | "leftShoulder" => Some(Self::LeftShoulder),
            "right_shoulder" | "rightShoulder" => Some(Self::RightShoulder),
            "left_elbow" | "leftElbow" => Some(Self::LeftElbow),
            "right_elbow" | "rightElbow" => Some(Self::RightElbow),
            "left_wrist" | "leftWrist" => Some(Self::LeftWrist),
            "right_wrist" | "rightWrist" => Some(Self::RightWrist),
            "left_hip" | "leftHip" => Some(Self::LeftHip),
            "right_hip" | "rightHip" => Some(Self::RightHip),
            "left_knee" | "leftKnee" => Some(Self::LeftKnee),
            "right_knee" | "rightKnee" => Some(Self::RightKnee),
            "left_ankle" | "leftAnkle" => Some(Self::LeftAnkle),
            "right_ankle" | "rightAnkle" => Some(Self::RightAnkle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "leftEye",
            Self::RightEye => "rightEye",
            Self::LeftEar => "leftEar",
            Self::RightEar => "rightEar",
            Self::LeftShoulder => "leftShoulder",
            Self::RightShoulder => "rightShoulder",
            Self::LeftElbow => "leftElbow",
            Self::RightElbow => "rightElbow",
            Self::LeftWrist => "leftWrist",
            Self::RightWrist => "rightWrist",
            Self::LeftHip => "leftHip",
            Self::RightHip => "rightHip",
            Self::LeftKnee => "leftKnee",
            Self::RightKnee => "rightKnee",
            Self::LeftAnkle => "leftAnkle",
            Self::RightAnkle => "rightAnkle",
        }
    }
}

/// 単一キーポイント
///
/// 座標はソース映像のピクセル座標。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub score: f32,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f32, y: f32, score: f32) -> Self {
        Self { name, x, y, score }
    }

    /// 信頼度が閾値を超えているか
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.score > threshold
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

/// 2点間のユークリッド距離
pub fn dist_between(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    (dx * dx + dy * dy).sqrt()
}

/// 1人分の姿勢（1ティックで検出された全キーポイント）
///
/// 名前の重複はない。適応（adapt）以降は平滑化以外で変更されない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pose {
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(score: f32, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }

    /// 名前でキーポイントを取得
    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }

    pub fn get_mut(&mut self, name: KeypointName) -> Option<&mut Keypoint> {
        self.keypoints.iter_mut().find(|k| k.name == name)
    }

    /// 全キーポイントの平均信頼度
    pub fn average_score(&self) -> f32 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.keypoints.iter().map(|k| k.score).sum();
        sum / self.keypoints.len() as f32
    }
}
