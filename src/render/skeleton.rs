use crate::pose::KeypointName;

/// 四肢ボーンの定義
pub struct Bone {
    pub from: KeypointName,
    pub to: KeypointName,
    /// スプライト名（AssetStore のキー）
    pub asset: &'static str,
    /// 描画太さ（ピクセル）
    pub thickness: f32,
}

/// 四肢ボーン一覧（胴体は肩・腰の中点から合成するため別扱い）
pub const LIMB_BONES: [Bone; 8] = [
    // 下半身
    Bone { from: KeypointName::LeftHip, to: KeypointName::LeftKnee, asset: "thigh", thickness: 40.0 },
    Bone { from: KeypointName::RightHip, to: KeypointName::RightKnee, asset: "thigh", thickness: 40.0 },
    Bone { from: KeypointName::LeftKnee, to: KeypointName::LeftAnkle, asset: "shin", thickness: 35.0 },
    Bone { from: KeypointName::RightKnee, to: KeypointName::RightAnkle, asset: "shin", thickness: 35.0 },
    // 上半身
    Bone { from: KeypointName::LeftShoulder, to: KeypointName::LeftElbow, asset: "upper_arm", thickness: 30.0 },
    Bone { from: KeypointName::RightShoulder, to: KeypointName::RightElbow, asset: "upper_arm", thickness: 30.0 },
    Bone { from: KeypointName::LeftElbow, to: KeypointName::LeftWrist, asset: "forearm", thickness: 25.0 },
    Bone { from: KeypointName::RightElbow, to: KeypointName::RightWrist, asset: "forearm", thickness: 25.0 },
];

/// 胴体（肩中点→腰中点）のスプライトと太さ
pub const TORSO_ASSET: &str = "body";
pub const TORSO_THICKNESS: f32 = 80.0;

/// ヘッドスプライトの描画サイズとアンカーオフセット
pub const HEAD_ASSET: &str = "head";
pub const HEAD_SIZE: f32 = 120.0;
pub const HEAD_OFFSET_X: f32 = 60.0;
pub const HEAD_OFFSET_Y: f32 = 100.0;
pub const HEAD_FALLBACK_RADIUS: i32 = 40;

/// 描画対象に採用するキーポイントの信頼度フロア
pub const DISPLAY_CONFIDENCE: f32 = 0.05;

/// スプライト欠落時の四肢フォールバック色 rgba(0,200,255,0.5)
pub const LIMB_FALLBACK_COLOR: u32 = 0x00C8FF;
pub const LIMB_FALLBACK_ALPHA: f32 = 0.5;

/// ヘッドのフォールバック色（オレンジ）
pub const HEAD_FALLBACK_COLOR: u32 = 0xFFA500;

/// 背景色
pub const BACKGROUND_COLOR: u32 = 0xFFFFFF;

/// フレーム落ちマーク付きフレームの背景色（グレー）
pub const DROPPED_BACKGROUND_COLOR: u32 = 0x808080;
