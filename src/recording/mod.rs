//! Recorded frame accumulation and the exported recording record.
//!
//! The JSON shape (camelCase keys) is the contract with downstream
//! playback/export tooling; field renames here are breaking changes.

use serde::{Deserialize, Serialize};

use crate::pose::{Keypoint, Pose};

/// フレームへ合成するオーバーレイアイテム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayItem {
    StopSign,
    AllowSign,
}

impl OverlayItem {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "stopsign" => Some(Self::StopSign),
            "allowsign" => Some(Self::AllowSign),
            _ => None,
        }
    }

    /// 対応するスプライト名
    pub fn asset_name(&self) -> &'static str {
        match self {
            Self::StopSign => "stopsign",
            Self::AllowSign => "allowsign",
        }
    }
}

/// トラッカーIDが付与されたポーズ（フレーム内の1人分）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPose {
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
    pub tracker_id: String,
}

impl TrackedPose {
    pub fn new(pose: Pose, tracker_id: String) -> Self {
        Self {
            score: pose.score,
            keypoints: pose.keypoints,
            tracker_id,
        }
    }
}

/// 確定済みの1フレーム。append 後は不変。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub frame_index: usize,
    /// 録画開始からの経過ミリ秒
    pub t: f64,
    pub video_width: u32,
    pub video_height: u32,
    pub poses: Vec<TrackedPose>,
    pub items: Vec<OverlayItem>,
    pub dropped: bool,
}

/// エクスポートされる録画レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub frames: Vec<Frame>,
    pub first_frame: usize,
    pub last_frame: usize,
    pub framerate: f32,
    pub export_width: u32,
    pub export_height: u32,
}

/// 先頭フレームの t を 0 とするようタイムスタンプを正規化する
pub fn normalize_time(recording: &mut Recording) {
    let Some(first) = recording.frames.first() else {
        return;
    };
    let base = first.t;
    for frame in &mut recording.frames {
        frame.t -= base;
    }
}

/// 追記専用のフレームバッファ
///
/// frame_index は append 時にバッファが採番するため、確定した録画では
/// 常に 0 起点の連番になる。
pub struct RecordingBuffer {
    frames: Vec<Frame>,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 直近に追記されたフレーム。プレビュー描画が参照する。
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn append(&mut self, mut frame: Frame) {
        frame.frame_index = self.frames.len();
        self.frames.push(frame);
    }

    /// 録画を確定する
    ///
    /// フレーム列を複製してバッファとの共有を断ち、タイムスタンプを
    /// 正規化し、エクスポート寸法を先頭フレームから写す。1フレームも
    /// なければ None（録画は生成されない）。
    pub fn stop(&self, framerate: f32) -> Option<Recording> {
        let first = self.frames.first()?;
        let mut recording = Recording {
            frames: self.frames.clone(),
            first_frame: 0,
            last_frame: self.frames.len() - 1,
            framerate,
            export_width: first.video_width,
            export_height: first.video_height,
        };
        normalize_time(&mut recording);
        Some(recording)
    }
}

impl Default for RecordingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
