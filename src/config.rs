use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::pose::DetectionMode;
use crate::recording::OverlayItem;

#[derive(Debug, Deserialize, Clone)]
pub struct RecorderConfig {
    /// キャプチャのフレームレート（ライブ時の目標、アップロード時の既定）
    #[serde(default = "default_framerate")]
    pub framerate: f32,
    /// 平滑化ウィンドウ長（フレーム数）
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// 検出モード ("single" / "multi")
    #[serde(default)]
    pub detection_mode: DetectionMode,
    /// プレビュー背景の不透明度 (0.0〜1.0)
    #[serde(default = "default_background_opacity")]
    pub background_opacity: f32,
    /// スプライト画像のディレクトリ
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
    /// フレームへ焼き込むオーバーレイアイテム名
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_framerate() -> f32 { 30.0 }
fn default_smoothing_window() -> usize { 4 }
fn default_background_opacity() -> f32 { 1.0 }
fn default_assets_dir() -> String { "assets".to_string() }

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            framerate: default_framerate(),
            smoothing_window: default_smoothing_window(),
            detection_mode: DetectionMode::default(),
            background_opacity: default_background_opacity(),
            assets_dir: default_assets_dir(),
            items: Vec::new(),
        }
    }
}

impl RecorderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: RecorderConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// アイテム名を解決する。未知の名前は無視する（警告のみ）。
    pub fn overlay_items(&self) -> Vec<OverlayItem> {
        self.items
            .iter()
            .filter_map(|name| {
                let item = OverlayItem::from_name(name);
                if item.is_none() {
                    log::warn!("unknown overlay item {:?}, ignoring", name);
                }
                item
            })
            .collect()
    }
}
